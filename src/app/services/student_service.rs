use crate::domain::model::{Student, StudentStatus};
use crate::domain::ports::StudentService;
use crate::utils::error::{CcrmError, Result};
use crate::utils::validation::Validate;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryStudentService {
    students: RwLock<BTreeMap<String, Student>>,
}

impl InMemoryStudentService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StudentService for InMemoryStudentService {
    fn add_student(&self, student: Student) -> Result<()> {
        student.validate()?;

        let mut students = self
            .students
            .write()
            .map_err(|_| CcrmError::invalid_state("student table lock poisoned"))?;
        if students.contains_key(&student.reg_no) {
            return Err(CcrmError::duplicate("student", student.reg_no));
        }

        tracing::debug!("Adding student {}", student.reg_no);
        students.insert(student.reg_no.clone(), student);
        Ok(())
    }

    fn find_student(&self, reg_no: &str) -> Option<Student> {
        let students = self.students.read().ok()?;
        students.get(reg_no.trim()).cloned()
    }

    fn list_students(&self) -> Vec<Student> {
        self.students
            .read()
            .map(|students| students.values().cloned().collect())
            .unwrap_or_default()
    }

    fn update_student(
        &self,
        reg_no: &str,
        full_name: Option<String>,
        email: Option<String>,
    ) -> Result<Student> {
        let mut students = self
            .students
            .write()
            .map_err(|_| CcrmError::invalid_state("student table lock poisoned"))?;
        let current = students
            .get(reg_no.trim())
            .ok_or_else(|| CcrmError::not_found("student", reg_no.trim()))?;

        let mut updated = current.clone();
        if let Some(name) = full_name {
            updated.full_name = name.trim().to_string();
        }
        if let Some(email) = email {
            updated.email = email.trim().to_string();
        }
        // validate before replacing so a rejected edit leaves the record intact
        updated.validate()?;

        tracing::debug!("Updating student {}", updated.reg_no);
        students.insert(updated.reg_no.clone(), updated.clone());
        Ok(updated)
    }

    fn deactivate_student(&self, reg_no: &str) -> Result<()> {
        let mut students = self
            .students
            .write()
            .map_err(|_| CcrmError::invalid_state("student table lock poisoned"))?;
        let student = students
            .get_mut(reg_no.trim())
            .ok_or_else(|| CcrmError::not_found("student", reg_no.trim()))?;

        if !student.is_active() {
            return Err(CcrmError::invalid_state(format!(
                "student {} is already inactive",
                student.reg_no
            )));
        }

        student.status = StudentStatus::Inactive;
        tracing::debug!("Deactivated student {}", student.reg_no);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with(reg_nos: &[&str]) -> InMemoryStudentService {
        let service = InMemoryStudentService::new();
        for reg_no in reg_nos {
            service
                .add_student(Student::new(*reg_no, "Test Student", "test@uni.edu"))
                .unwrap();
        }
        service
    }

    #[test]
    fn test_add_and_find_student() {
        let service = service_with(&["R002"]);
        let found = service.find_student("R002").unwrap();
        assert_eq!(found.full_name, "Test Student");
        assert!(service.find_student("R999").is_none());
    }

    #[test]
    fn test_duplicate_reg_no_is_rejected() {
        let service = service_with(&["R001"]);
        let err = service
            .add_student(Student::new("R001", "Other", "other@uni.edu"))
            .unwrap_err();
        assert!(matches!(err, CcrmError::Duplicate { .. }));
    }

    #[test]
    fn test_invalid_student_is_rejected() {
        let service = InMemoryStudentService::new();
        let err = service
            .add_student(Student::new("R001", "Ada", "bad-email"))
            .unwrap_err();
        assert!(matches!(err, CcrmError::ValidationError { .. }));
        assert!(service.list_students().is_empty());
    }

    #[test]
    fn test_list_is_ordered_by_reg_no() {
        let service = service_with(&["R003", "R001", "R002"]);
        let reg_nos: Vec<String> = service
            .list_students()
            .into_iter()
            .map(|s| s.reg_no)
            .collect();
        assert_eq!(reg_nos, vec!["R001", "R002", "R003"]);
    }

    #[test]
    fn test_update_student_keeps_record_on_invalid_email() {
        let service = service_with(&["R001"]);

        let updated = service
            .update_student("R001", Some("Renamed".to_string()), None)
            .unwrap();
        assert_eq!(updated.full_name, "Renamed");

        assert!(service
            .update_student("R001", None, Some("nope".to_string()))
            .is_err());
        assert_eq!(service.find_student("R001").unwrap().email, "test@uni.edu");
    }

    #[test]
    fn test_deactivate_student() {
        let service = service_with(&["R001"]);
        service.deactivate_student("R001").unwrap();
        assert!(!service.find_student("R001").unwrap().is_active());

        let err = service.deactivate_student("R001").unwrap_err();
        assert!(matches!(err, CcrmError::InvalidState { .. }));

        let err = service.deactivate_student("R404").unwrap_err();
        assert!(matches!(err, CcrmError::NotFound { .. }));
    }
}
