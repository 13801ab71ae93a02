//! Static fallback catalog: hand-written lessons and question sets that keep
//! the app useful when neither the model nor the store can serve a request.
//!
//! The tables are immutable and built once per process; unknown topics get
//! the generic entry of each kind.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::domain::{LessonDraft, QuestionDraft, QUIZ_SIZE};

struct Lesson {
  title: &'static str,
  body: &'static str,
  difficulty: &'static str,
}

struct Question {
  question: &'static str,
  options: [&'static str; 4],
  correct: &'static str,
  explanation: &'static str,
}

const GENERIC_LESSON: Lesson = Lesson {
  title: "International Student Guide",
  body: "This section provides important information for international students. \
Your International Student Office is the first place to ask about paperwork, deadlines and campus services. \
Keep copies of your important documents, read every message from your school carefully, and ask for help early \
whenever something is unclear.",
  difficulty: "Beginner",
};

const GENERIC_QUESTIONS: [Question; QUIZ_SIZE] = [
  Question {
    question: "What is the most important resource for international students?",
    options: ["The library", "International Student Office", "Cafeteria", "Bookstore"],
    correct: "International Student Office",
    explanation: "The International Student Office provides specialized support and guidance for international students.",
  },
  Question {
    question: "When should you seek help if you're struggling academically?",
    options: ["After failing a test", "As soon as you notice difficulties", "At the end of the semester", "Never"],
    correct: "As soon as you notice difficulties",
    explanation: "Early intervention is key to academic success and there are many resources available to help.",
  },
  Question {
    question: "What is expected behavior in group projects?",
    options: ["Let others do all the work", "Contribute equally and communicate regularly", "Only work alone", "Take over completely"],
    correct: "Contribute equally and communicate regularly",
    explanation: "Teamwork and communication are essential skills valued in academic and professional settings.",
  },
  Question {
    question: "How should you handle cultural differences you encounter?",
    options: ["Ignore them", "Ask respectful questions and be open to learning", "Criticize different practices", "Avoid people from other cultures"],
    correct: "Ask respectful questions and be open to learning",
    explanation: "Cultural curiosity and respect help build understanding and meaningful relationships.",
  },
  Question {
    question: "What should you do if you're feeling homesick?",
    options: ["Isolate yourself", "Reach out to support services and friends", "Immediately go home", "Ignore the feelings"],
    correct: "Reach out to support services and friends",
    explanation: "Homesickness is normal, and universities have counseling services and support groups to help.",
  },
];

static LESSONS: LazyLock<HashMap<&'static str, Lesson>> = LazyLock::new(|| {
  HashMap::from([
    ("campus-life", Lesson {
      title: "Campus Life and Social Norms - Getting Started Guide",
      body: "Campus life in North America offers many ways to engage, learn and grow.\n\n\
**Key Campus Resources:**\nOrientation programs, cultural organizations and the International Student Office \
are your first stops for academic and social guidance.\n\n\
**Social Interactions:**\nCampus culture tends to be informal and inclusive. Students study in groups, join clubs \
and attend campus events. Introduce yourself to classmates and join study groups.\n\n\
**Academic Culture:**\nClass participation is valued. Office hours exist for extra help, and using them shows initiative.\n\n\
**Communication Styles:**\nDirect but polite communication is the norm. Small talk about classes or weekend plans helps build relationships.",
      difficulty: "Beginner",
    }),
    ("general-mannerisms", Lesson {
      title: "General Mannerisms and Social Etiquette Guide",
      body: "Knowing everyday etiquette helps you feel confident in daily interactions.\n\n\
**Greetings:**\nA handshake, eye contact and a smile are standard in formal introductions; among peers a simple \"Hi\" is common.\n\n\
**Personal Space:**\nKeep about an arm's length of distance in conversation.\n\n\
**Conversation:**\nListen actively, ask follow-up questions and avoid interrupting.\n\n\
**Dining:**\nWait until everyone is served. Splitting the bill is common, and tipping 15-20% at restaurants is expected.\n\n\
**Punctuality:**\nArrive a few minutes early and send a message if you are running late.",
      difficulty: "Intermediate",
    }),
    ("banking", Lesson {
      title: "Banking and Financial Management for Students",
      body: "Setting up banking services is one of your first practical tasks.\n\n\
**Opening an Account:**\nBanks usually ask for your passport, I-20 and proof of enrollment. Student accounts often have no monthly fee.\n\n\
**Account Types:**\nChecking accounts handle daily spending; savings accounts earn interest.\n\n\
**Building Credit:**\nA secured or student credit card paid in full and on time builds your credit history.\n\n\
**Fees to Avoid:**\nOverdraft fees, out-of-network ATM fees and minimum balance fees.\n\n\
**Safety:**\nNever share your PIN or online banking password.",
      difficulty: "Beginner",
    }),
    ("visa-status", Lesson {
      title: "Maintaining Visa Status",
      body: "Maintaining your F-1 or J-1 status keeps your stay legal.\n\n\
**Full-Time Enrollment:**\nUndergraduates typically need 12+ credit hours per semester. Dropping below full time without authorization can jeopardize your status.\n\n\
**Reporting:**\nReport address changes to your school within 10 days so SEVIS stays current.\n\n\
**Employment:**\nOn-campus work is generally limited to 20 hours per week during the academic year; off-campus work needs CPT or OPT authorization.\n\n\
**Travel:**\nTo re-enter you need a valid passport, visa and an I-20 with a current travel signature.\n\n\
**Grace Periods:**\nF-1 students have 60 days after program completion; J-1 students have 30.",
      difficulty: "Advanced",
    }),
    ("housing", Lesson {
      title: "Housing and Accommodation - Finding Your Home Away From Home",
      body: "**Options:**\nUniversities offer residence halls, apartments and shared houses with different costs and amenities.\n\n\
**On-Campus:**\nConvenient and social, often bundled with a meal plan, but usually more expensive.\n\n\
**Off-Campus:**\nMore affordable and independent, but you handle utilities, maintenance and transport.\n\n\
**Leases:**\nRead the whole lease before signing: rent, due dates, deposit terms and who pays for repairs.\n\n\
**Timing:**\nStart looking two to three months ahead; good places near campus fill quickly.",
      difficulty: "Beginner",
    }),
    ("transportation", Lesson {
      title: "Transportation Systems - Getting Around Campus and City",
      body: "**Public Transportation:**\nLearn bus and train routes; many schools offer discounted transit passes.\n\n\
**Campus Shuttles:**\nFree shuttles often link campus, nearby housing and popular destinations.\n\n\
**Ride-Sharing:**\nVerify the driver and car match the app and share your trip with a friend.\n\n\
**Driving:**\nYou need a valid license and car insurance; an international permit is typically valid for one year.\n\n\
**Safety:**\nPlan your route, keep your phone charged and know that 911 reaches emergency services.",
      difficulty: "Beginner",
    }),
    ("healthcare", Lesson {
      title: "Healthcare and Insurance - Staying Healthy as a Student",
      body: "**Insurance:**\nMost universities require international students to carry health insurance, through the school plan or a private provider.\n\n\
**Campus Health Center:**\nYour first stop for routine care, vaccinations and referrals.\n\n\
**Emergencies:**\nGo to the emergency room or call 911 for anything life-threatening.\n\n\
**Mental Health:**\nCounseling centers offer free or low-cost support.\n\n\
**Always Carry:**\nYour insurance card, so you can receive care when you need it.",
      difficulty: "Beginner",
    }),
    ("terminology", Lesson {
      title: "Modern Terminology and Slang",
      body: "**Academic Terms:**\nSyllabus, office hours, credit hours, midterm and GPA appear in every course.\n\n\
**Everyday Slang:**\n\"No cap\" means no lie; \"lowkey\" means slightly or secretly; content that goes \"viral\" spreads quickly online.\n\n\
**Using Slang:**\nListen first and use informal words with friends, not in emails to professors.",
      difficulty: "Advanced",
    }),
  ])
});

static QUESTIONS: LazyLock<HashMap<&'static str, [Question; QUIZ_SIZE]>> = LazyLock::new(|| {
  HashMap::from([
    ("campus-life", [
      Question {
        question: "What is the best way to meet other students on campus?",
        options: ["Stay in your dorm room", "Join student organizations and clubs", "Only study alone", "Avoid campus events"],
        correct: "Join student organizations and clubs",
        explanation: "Student organizations are the primary way students connect and build friendships on campus.",
      },
      Question {
        question: "When should you visit your professor's office hours?",
        options: ["Only when you're failing", "Never, it's bothering them", "Anytime you have questions or need help", "Only before exams"],
        correct: "Anytime you have questions or need help",
        explanation: "Office hours are specifically designed for student questions and academic support.",
      },
      Question {
        question: "What is considered appropriate behavior in American classrooms?",
        options: ["Never ask questions", "Participate in discussions when appropriate", "Always stay silent", "Only speak when directly asked"],
        correct: "Participate in discussions when appropriate",
        explanation: "Class participation is valued and expected in most university settings.",
      },
      Question {
        question: "How should you address your professors?",
        options: ["By their first name only", "Professor [Last Name] unless told otherwise", "Sir or Madam", "Teacher"],
        correct: "Professor [Last Name] unless told otherwise",
        explanation: "Formal titles show respect, though many professors invite you to use their first name.",
      },
      Question {
        question: "What should you do if you don't understand something in class?",
        options: ["Pretend you understand", "Ask for clarification politely", "Skip that topic", "Wait until someone else asks"],
        correct: "Ask for clarification politely",
        explanation: "Asking questions shows engagement and helps ensure you understand the material.",
      },
    ]),
    ("visa-status", [
      Question {
        question: "How many credit hours must F-1 students typically take to maintain full-time status?",
        options: ["6 hours", "9 hours", "12+ hours", "15 hours"],
        correct: "12+ hours",
        explanation: "F-1 undergraduates usually must take at least 12 credit hours per semester.",
      },
      Question {
        question: "How quickly must you report address changes to your school?",
        options: ["Within 30 days", "Within 10 days", "Within 60 days", "No time limit"],
        correct: "Within 10 days",
        explanation: "Address changes must be reported within 10 days to keep SEVIS records compliant.",
      },
      Question {
        question: "What do you need to re-enter the US after traveling?",
        options: ["Only a passport", "Passport, valid visa, and current I-20", "Just your student ID", "Only a driver's license"],
        correct: "Passport, valid visa, and current I-20",
        explanation: "You need a passport, a valid F-1 visa and an I-20 with a travel signature.",
      },
      Question {
        question: "What happens if you fall below full-time enrollment without authorization?",
        options: ["Nothing happens", "You get a warning", "It can violate your visa status", "You get extra time"],
        correct: "It can violate your visa status",
        explanation: "Unauthorized reduced enrollment can result in loss of legal status.",
      },
      Question {
        question: "Who should you contact for visa and immigration questions?",
        options: ["Any professor", "Your roommate", "International Student Office", "Campus security"],
        correct: "International Student Office",
        explanation: "The International Student Office is your primary resource for immigration questions.",
      },
    ]),
    ("housing", [
      Question {
        question: "What should you do before signing a lease?",
        options: ["Sign immediately", "Read the entire lease carefully", "Ask your friend to sign for you", "Skip reading the fine print"],
        correct: "Read the entire lease carefully",
        explanation: "Reading the whole lease tells you your rights, responsibilities and any hidden fees.",
      },
      Question {
        question: "What is a security deposit typically used for?",
        options: ["Monthly rent payment", "Covering damages when you move out", "Utilities", "Furniture"],
        correct: "Covering damages when you move out",
        explanation: "The deposit covers damage at move-out and is returned if the property is in good condition.",
      },
      Question {
        question: "What should you do if you have a problem with your landlord?",
        options: ["Ignore it", "Document everything in writing", "Complain to neighbors", "Move out immediately"],
        correct: "Document everything in writing",
        explanation: "Written records of every communication protect you if a dispute escalates.",
      },
      Question {
        question: "What is typically included in rent for student housing?",
        options: ["Everything", "Just the room", "Room and utilities", "Room, utilities, and meals"],
        correct: "Room and utilities",
        explanation: "Student housing usually includes the room and basic utilities; meals are often separate.",
      },
      Question {
        question: "When should you start looking for housing for the next semester?",
        options: ["The day before classes start", "A few weeks before", "2-3 months before", "After graduation"],
        correct: "2-3 months before",
        explanation: "Good options near campus fill up quickly, so start two to three months ahead.",
      },
    ]),
    ("transportation", [
      Question {
        question: "What is the best way to get around campus?",
        options: ["Drive everywhere", "Walk or use campus shuttles", "Take taxis", "Ride a motorcycle"],
        correct: "Walk or use campus shuttles",
        explanation: "Walking is often most convenient, and many universities run free shuttles.",
      },
      Question {
        question: "What should you do before using ride-sharing services?",
        options: ["Nothing special", "Verify driver information and share trip details", "Pay extra for safety", "Only use during the day"],
        correct: "Verify driver information and share trip details",
        explanation: "Check the driver matches the app and share your trip with friends.",
      },
      Question {
        question: "What do you need to drive in the US as an international student?",
        options: ["Just your passport", "Valid driver's license and car insurance", "Only a student ID", "Nothing special"],
        correct: "Valid driver's license and car insurance",
        explanation: "Driving legally requires a valid license and car insurance.",
      },
      Question {
        question: "What should you do if you get lost while using public transportation?",
        options: ["Panic and get off immediately", "Ask the driver or other passengers for help", "Keep riding until you recognize something", "Call 911"],
        correct: "Ask the driver or other passengers for help",
        explanation: "Most people are willing to help with directions.",
      },
      Question {
        question: "What is a good safety tip for using transportation?",
        options: ["Travel alone at night", "Keep your phone charged and have emergency contacts ready", "Don't plan your route", "Ignore your surroundings"],
        correct: "Keep your phone charged and have emergency contacts ready",
        explanation: "A charged phone and ready contacts let you get help quickly.",
      },
    ]),
    ("healthcare", [
      Question {
        question: "What is required for most international students regarding health insurance?",
        options: ["No insurance needed", "Optional insurance", "Health insurance is required", "Only for emergencies"],
        correct: "Health insurance is required",
        explanation: "Most universities require international students to carry health insurance.",
      },
      Question {
        question: "What should you do if you have a medical emergency?",
        options: ["Wait until morning", "Go to the emergency room immediately", "Call your parents first", "Search online for solutions"],
        correct: "Go to the emergency room immediately",
        explanation: "For emergencies go to the emergency room or call 911 without delay.",
      },
      Question {
        question: "Where can you usually find free or low-cost mental health services?",
        options: ["Only private clinics", "University counseling centers", "Emergency rooms only", "Nowhere"],
        correct: "University counseling centers",
        explanation: "Most universities offer free or low-cost counseling for students.",
      },
      Question {
        question: "What should you keep with you at all times regarding healthcare?",
        options: ["Your passport", "Your insurance card", "Cash only", "Nothing special"],
        correct: "Your insurance card",
        explanation: "Carrying your insurance card lets you receive care when needed.",
      },
      Question {
        question: "What is preventive care?",
        options: ["Only treating serious illnesses", "Regular check-ups and screenings to prevent problems", "Emergency care only", "Alternative medicine"],
        correct: "Regular check-ups and screenings to prevent problems",
        explanation: "Preventive care means check-ups, screenings and healthy habits.",
      },
    ]),
  ])
});

/// Fallback lesson for `topic`; never fails.
pub fn fallback_lesson(topic: &str) -> LessonDraft {
  let l = LESSONS.get(topic).unwrap_or(&GENERIC_LESSON);
  LessonDraft {
    title: l.title.to_string(),
    body: l.body.to_string(),
    difficulty: l.difficulty.to_string(),
  }
}

/// Fallback question set for `topic`; always exactly `QUIZ_SIZE` questions.
pub fn fallback_questions(topic: &str) -> Vec<QuestionDraft> {
  let set = QUESTIONS.get(topic).unwrap_or(&GENERIC_QUESTIONS);
  set
    .iter()
    .map(|q| QuestionDraft {
      question: q.question.to_string(),
      options: q.options.iter().map(|o| o.to_string()).collect(),
      correct_answer: q.correct.to_string(),
      explanation: Some(q.explanation.to_string()),
      difficulty: Some("Beginner".to_string()),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quiz::validate_question;

  const ALL_KEYS: &[&str] = &[
    "campus-life", "general-mannerisms", "banking", "transportation", "housing", "healthcare",
    "terminology", "visa-status", "campus-jobs", "laws", "student-office", "no-such-topic",
  ];

  #[test]
  fn every_topic_has_a_non_empty_lesson() {
    for key in ALL_KEYS {
      let l = fallback_lesson(key);
      assert!(!l.title.is_empty(), "{key}");
      assert!(!l.body.trim().is_empty(), "{key}");
    }
  }

  #[test]
  fn catalog_lessons_are_never_stale() {
    use crate::domain::{LessonContent, Scope};
    for key in ALL_KEYS {
      let c = LessonContent::unpersisted(key, Scope::Global, fallback_lesson(key));
      assert!(!c.is_stale(), "{key}");
    }
  }

  #[test]
  fn every_question_set_passes_the_validator_unchanged() {
    for key in ALL_KEYS {
      let set = fallback_questions(key);
      assert_eq!(set.len(), QUIZ_SIZE, "{key}");
      for q in set {
        let checked = validate_question(q.clone()).expect("catalog question must validate");
        assert_eq!(checked, q);
      }
    }
  }

  #[test]
  fn unknown_topic_gets_generic_entries() {
    assert_eq!(fallback_lesson("astrophysics").title, GENERIC_LESSON.title);
    assert_eq!(
      fallback_questions("astrophysics")[0].question,
      GENERIC_QUESTIONS[0].question
    );
  }
}
