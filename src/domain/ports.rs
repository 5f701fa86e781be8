use crate::domain::model::{Course, CourseFilter, Enrollment, Grade, Student};
use crate::utils::error::Result;

pub trait StudentService: Send + Sync {
    fn add_student(&self, student: Student) -> Result<()>;
    fn find_student(&self, reg_no: &str) -> Option<Student>;
    /// All students ordered by registration number.
    fn list_students(&self) -> Vec<Student>;
    fn update_student(
        &self,
        reg_no: &str,
        full_name: Option<String>,
        email: Option<String>,
    ) -> Result<Student>;
    fn deactivate_student(&self, reg_no: &str) -> Result<()>;
}

pub trait CourseService: Send + Sync {
    fn add_course(&self, course: Course) -> Result<()>;
    /// Lookup is case-insensitive on the course code.
    fn find_course(&self, code: &str) -> Option<Course>;
    fn list_courses(&self) -> Vec<Course>;
    fn search_courses(&self, filter: &CourseFilter) -> Vec<Course>;
    fn assign_instructor(&self, code: &str, instructor: &str) -> Result<Course>;
    fn deactivate_course(&self, code: &str) -> Result<()>;
}

pub trait EnrollmentService: Send + Sync {
    fn enroll(&self, student: &Student, course: &Course) -> Result<Enrollment>;
    fn unenroll(&self, reg_no: &str, course_code: &str) -> Result<()>;
    fn record_grade(&self, reg_no: &str, course_code: &str, grade: Grade) -> Result<()>;
    fn enrollments_for_student(&self, reg_no: &str) -> Vec<Enrollment>;
    fn list_enrollments(&self) -> Vec<Enrollment>;
    /// Re-inserts a previously exported enrollment; only the duplicate check applies.
    fn restore_enrollment(&self, enrollment: Enrollment) -> Result<()>;
}
