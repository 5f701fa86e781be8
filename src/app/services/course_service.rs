use crate::domain::model::{normalize_course_code, Course, CourseFilter};
use crate::domain::ports::CourseService;
use crate::utils::error::{CcrmError, Result};
use crate::utils::validation::Validate;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Courses keyed by upper-case code.
#[derive(Debug, Default)]
pub struct InMemoryCourseService {
    courses: RwLock<BTreeMap<String, Course>>,
}

impl InMemoryCourseService {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_course_mut<T>(&self, code: &str, f: impl FnOnce(&mut Course) -> Result<T>) -> Result<T> {
        let key = normalize_course_code(code);
        let mut courses = self
            .courses
            .write()
            .map_err(|_| CcrmError::invalid_state("course table lock poisoned"))?;
        let course = courses
            .get_mut(&key)
            .ok_or_else(|| CcrmError::not_found("course", key.clone()))?;
        f(course)
    }
}

impl CourseService for InMemoryCourseService {
    fn add_course(&self, mut course: Course) -> Result<()> {
        course.code = normalize_course_code(&course.code);
        course.validate()?;

        let mut courses = self
            .courses
            .write()
            .map_err(|_| CcrmError::invalid_state("course table lock poisoned"))?;
        if courses.contains_key(&course.code) {
            return Err(CcrmError::duplicate("course", course.code));
        }

        tracing::debug!("Adding course {} ({} credits)", course.code, course.credits);
        courses.insert(course.code.clone(), course);
        Ok(())
    }

    fn find_course(&self, code: &str) -> Option<Course> {
        let courses = self.courses.read().ok()?;
        courses.get(&normalize_course_code(code)).cloned()
    }

    fn list_courses(&self) -> Vec<Course> {
        self.courses
            .read()
            .map(|courses| courses.values().cloned().collect())
            .unwrap_or_default()
    }

    fn search_courses(&self, filter: &CourseFilter) -> Vec<Course> {
        self.courses
            .read()
            .map(|courses| {
                courses
                    .values()
                    .filter(|course| filter.matches(course))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn assign_instructor(&self, code: &str, instructor: &str) -> Result<Course> {
        self.with_course_mut(code, |course| {
            course.instructor = instructor.trim().to_string();
            tracing::debug!("Assigned '{}' to {}", course.instructor, course.code);
            Ok(course.clone())
        })
    }

    fn deactivate_course(&self, code: &str) -> Result<()> {
        self.with_course_mut(code, |course| {
            if !course.active {
                return Err(CcrmError::invalid_state(format!(
                    "course {} is already inactive",
                    course.code
                )));
            }
            course.active = false;
            tracing::debug!("Deactivated course {}", course.code);
            Ok(())
        })
    }
}
