pub mod course_service;
pub mod enrollment_service;
pub mod student_service;

pub use course_service::InMemoryCourseService;
pub use enrollment_service::{InMemoryEnrollmentService, DEFAULT_MAX_CREDITS_PER_SEMESTER};
pub use student_service::InMemoryStudentService;
