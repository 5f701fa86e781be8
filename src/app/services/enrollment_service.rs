use crate::domain::model::{normalize_course_code, Course, Enrollment, Grade, Student};
use crate::domain::ports::EnrollmentService;
use crate::utils::error::{CcrmError, Result};
use std::sync::RwLock;

pub const DEFAULT_MAX_CREDITS_PER_SEMESTER: u32 = 24;

#[derive(Debug)]
pub struct InMemoryEnrollmentService {
    enrollments: RwLock<Vec<Enrollment>>,
    max_credits_per_semester: u32,
}

impl Default for InMemoryEnrollmentService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEnrollmentService {
    pub fn new() -> Self {
        Self::with_credit_limit(DEFAULT_MAX_CREDITS_PER_SEMESTER)
    }

    pub fn with_credit_limit(max_credits_per_semester: u32) -> Self {
        Self {
            enrollments: RwLock::new(Vec::new()),
            max_credits_per_semester,
        }
    }

    fn lock_poisoned() -> CcrmError {
        CcrmError::invalid_state("enrollment table lock poisoned")
    }
}

impl EnrollmentService for InMemoryEnrollmentService {
    fn enroll(&self, student: &Student, course: &Course) -> Result<Enrollment> {
        if !student.is_active() {
            return Err(CcrmError::invalid_state(format!(
                "student {} is inactive",
                student.reg_no
            )));
        }
        if !course.active {
            return Err(CcrmError::invalid_state(format!(
                "course {} is inactive",
                course.code
            )));
        }

        let mut enrollments = self.enrollments.write().map_err(|_| Self::lock_poisoned())?;
        if enrollments
            .iter()
            .any(|e| e.matches(&student.reg_no, &course.code))
        {
            return Err(CcrmError::duplicate(
                "enrollment",
                format!("{}/{}", student.reg_no, course.code),
            ));
        }

        let current: u32 = enrollments
            .iter()
            .filter(|e| e.reg_no == student.reg_no && e.semester == course.semester)
            .map(|e| u32::from(e.credits))
            .sum();
        let attempted = current + u32::from(course.credits);
        if attempted > self.max_credits_per_semester {
            return Err(CcrmError::CreditLimitExceeded {
                reg_no: student.reg_no.clone(),
                semester: course.semester.to_string(),
                attempted,
                limit: self.max_credits_per_semester,
            });
        }

        let enrollment = Enrollment::new(student, course);
        tracing::debug!(
            "Enrolled {} in {} ({}/{} credits for {})",
            enrollment.reg_no,
            enrollment.course_code,
            attempted,
            self.max_credits_per_semester,
            enrollment.semester
        );
        enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    fn unenroll(&self, reg_no: &str, course_code: &str) -> Result<()> {
        let mut enrollments = self.enrollments.write().map_err(|_| Self::lock_poisoned())?;
        let before = enrollments.len();
        enrollments.retain(|e| !e.matches(reg_no.trim(), course_code));

        if enrollments.len() == before {
            return Err(CcrmError::not_found(
                "enrollment",
                format!("{}/{}", reg_no.trim(), normalize_course_code(course_code)),
            ));
        }
        tracing::debug!("Unenrolled {} from {}", reg_no.trim(), course_code);
        Ok(())
    }

    fn record_grade(&self, reg_no: &str, course_code: &str, grade: Grade) -> Result<()> {
        let mut enrollments = self.enrollments.write().map_err(|_| Self::lock_poisoned())?;
        let enrollment = enrollments
            .iter_mut()
            .find(|e| e.matches(reg_no.trim(), course_code))
            .ok_or_else(|| {
                CcrmError::not_found(
                    "enrollment",
                    format!("{}/{}", reg_no.trim(), normalize_course_code(course_code)),
                )
            })?;

        enrollment.grade = Some(grade);
        tracing::debug!(
            "Recorded grade {} for {} in {}",
            grade,
            enrollment.reg_no,
            enrollment.course_code
        );
        Ok(())
    }

    fn enrollments_for_student(&self, reg_no: &str) -> Vec<Enrollment> {
        self.enrollments
            .read()
            .map(|enrollments| {
                enrollments
                    .iter()
                    .filter(|e| e.reg_no == reg_no.trim())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn list_enrollments(&self) -> Vec<Enrollment> {
        self.enrollments
            .read()
            .map(|enrollments| enrollments.clone())
            .unwrap_or_default()
    }

    fn restore_enrollment(&self, mut enrollment: Enrollment) -> Result<()> {
        enrollment.course_code = normalize_course_code(&enrollment.course_code);
        let mut enrollments = self.enrollments.write().map_err(|_| Self::lock_poisoned())?;
        if enrollments
            .iter()
            .any(|e| e.matches(&enrollment.reg_no, &enrollment.course_code))
        {
            return Err(CcrmError::duplicate(
                "enrollment",
                format!("{}/{}", enrollment.reg_no, enrollment.course_code),
            ));
        }
        enrollments.push(enrollment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Semester, StudentStatus};

    fn student() -> Student {
        Student::new("R001", "Ada Lovelace", "ada@uni.edu")
    }

    fn course(code: &str, credits: u8, semester: Semester) -> Course {
        Course::new(code, "Course", credits, "CSE", semester)
    }

    #[test]
    fn test_enroll_and_list() {
        let service = InMemoryEnrollmentService::new();
        let enrollment = service
            .enroll(&student(), &course("CS101", 4, Semester::Fall))
            .unwrap();
        assert_eq!(enrollment.course_code, "CS101");
        assert_eq!(enrollment.grade, None);
        assert_eq!(service.enrollments_for_student("R001").len(), 1);
        assert!(service.enrollments_for_student("R002").is_empty());
    }

    #[test]
    fn test_duplicate_enrollment_rejected() {
        let service = InMemoryEnrollmentService::new();
        let c = course("CS101", 4, Semester::Fall);
        service.enroll(&student(), &c).unwrap();
        assert!(matches!(
            service.enroll(&student(), &c).unwrap_err(),
            CcrmError::Duplicate { .. }
        ));
    }

    #[test]
    fn test_credit_limit_is_per_semester() {
        let service = InMemoryEnrollmentService::with_credit_limit(8);
        service
            .enroll(&student(), &course("CS101", 4, Semester::Fall))
            .unwrap();
        service
            .enroll(&student(), &course("CS102", 4, Semester::Fall))
            .unwrap();

        let err = service
            .enroll(&student(), &course("CS103", 1, Semester::Fall))
            .unwrap_err();
        match err {
            CcrmError::CreditLimitExceeded {
                attempted, limit, ..
            } => {
                assert_eq!(attempted, 9);
                assert_eq!(limit, 8);
            }
            other => panic!("unexpected error: {other}"),
        }

        // a different semester has its own budget
        service
            .enroll(&student(), &course("CS201", 4, Semester::Spring))
            .unwrap();
    }

    #[test]
    fn test_inactive_student_or_course_cannot_enroll() {
        let service = InMemoryEnrollmentService::new();
        let mut inactive = student();
        inactive.status = StudentStatus::Inactive;
        assert!(service
            .enroll(&inactive, &course("CS101", 4, Semester::Fall))
            .is_err());

        let mut closed = course("CS102", 4, Semester::Fall);
        closed.active = false;
        assert!(matches!(
            service.enroll(&student(), &closed).unwrap_err(),
            CcrmError::InvalidState { .. }
        ));
    }

    #[test]
    fn test_record_grade_and_unenroll() {
        let service = InMemoryEnrollmentService::new();
        service
            .enroll(&student(), &course("CS101", 4, Semester::Fall))
            .unwrap();

        service.record_grade("R001", "cs101", Grade::A).unwrap();
        assert_eq!(
            service.enrollments_for_student("R001")[0].grade,
            Some(Grade::A)
        );
        assert!(service.record_grade("R001", "MA101", Grade::A).is_err());

        service.unenroll("R001", "CS101").unwrap();
        assert!(service.list_enrollments().is_empty());
        assert!(matches!(
            service.unenroll("R001", "CS101").unwrap_err(),
            CcrmError::NotFound { .. }
        ));
    }

    #[test]
    fn test_restore_skips_credit_limit_but_not_duplicates() {
        let service = InMemoryEnrollmentService::with_credit_limit(1);
        let mut enrollment = Enrollment::new(&student(), &course("CS101", 4, Semester::Fall));
        enrollment.course_code = "cs101".to_string();

        service.restore_enrollment(enrollment.clone()).unwrap();
        assert_eq!(service.list_enrollments()[0].course_code, "CS101");
        assert!(service.restore_enrollment(enrollment).is_err());
    }
}
