use crate::utils::error::{CcrmError, Result};
use crate::utils::validation::{
    validate_email, validate_identifier, validate_non_empty_string, validate_range, Validate,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_COURSE_CREDITS: u8 = 1;
pub const MAX_COURSE_CREDITS: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Semester {
    Spring,
    Summer,
    Fall,
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Semester::Spring => "spring",
            Semester::Summer => "summer",
            Semester::Fall => "fall",
        };
        f.pad(name)
    }
}

impl FromStr for Semester {
    type Err = CcrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spring" => Ok(Semester::Spring),
            "summer" => Ok(Semester::Summer),
            "fall" | "autumn" => Ok(Semester::Fall),
            other => Err(CcrmError::validation(format!(
                "unknown semester '{}', expected spring|summer|fall",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Semester {
    type Error = CcrmError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Letter grade on the ten-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub fn points(self) -> u32 {
        match self {
            Grade::S => 10,
            Grade::A => 9,
            Grade::B => 8,
            Grade::C => 7,
            Grade::D => 6,
            Grade::E => 5,
            Grade::F => 0,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Grade {
    type Err = CcrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(Grade::S),
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "E" => Ok(Grade::E),
            "F" => Ok(Grade::F),
            other => Err(CcrmError::validation(format!(
                "unknown grade '{}', expected one of S A B C D E F",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Grade {
    type Error = CcrmError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Inactive,
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentStatus::Active => f.pad("active"),
            StudentStatus::Inactive => f.pad("inactive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub reg_no: String,
    pub full_name: String,
    pub email: String,
    pub status: StudentStatus,
    pub created_on: NaiveDate,
}

impl Student {
    /// Creates an active student dated today.
    pub fn new(
        reg_no: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            reg_no: reg_no.into().trim().to_string(),
            full_name: full_name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            status: StudentStatus::Active,
            created_on: Local::now().date_naive(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

impl Validate for Student {
    fn validate(&self) -> Result<()> {
        validate_identifier("reg_no", &self.reg_no)?;
        validate_non_empty_string("full_name", &self.full_name)?;
        validate_email("email", &self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub title: String,
    pub credits: u8,
    pub instructor: String,
    pub department: String,
    pub semester: Semester,
    pub active: bool,
}

impl Course {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        credits: u8,
        department: impl Into<String>,
        semester: Semester,
    ) -> Self {
        Self {
            code: normalize_course_code(&code.into()),
            title: title.into().trim().to_string(),
            credits,
            instructor: String::new(),
            department: department.into().trim().to_string(),
            semester,
            active: true,
        }
    }

    pub fn with_instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = instructor.into().trim().to_string();
        self
    }
}

impl Validate for Course {
    fn validate(&self) -> Result<()> {
        validate_identifier("code", &self.code)?;
        if !self.code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CcrmError::validation(format!(
                "code must be alphanumeric: '{}'",
                self.code
            )));
        }
        validate_non_empty_string("title", &self.title)?;
        validate_non_empty_string("department", &self.department)?;
        validate_range(
            "credits",
            self.credits,
            MIN_COURSE_CREDITS,
            MAX_COURSE_CREDITS,
        )
    }
}

pub fn normalize_course_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub reg_no: String,
    pub course_code: String,
    pub semester: Semester,
    pub credits: u8,
    pub enrolled_on: NaiveDate,
    pub grade: Option<Grade>,
}

impl Enrollment {
    pub fn new(student: &Student, course: &Course) -> Self {
        Self {
            reg_no: student.reg_no.clone(),
            course_code: course.code.clone(),
            semester: course.semester,
            credits: course.credits,
            enrolled_on: Local::now().date_naive(),
            grade: None,
        }
    }

    pub fn matches(&self, reg_no: &str, course_code: &str) -> bool {
        self.reg_no == reg_no && self.course_code == normalize_course_code(course_code)
    }
}

/// Search criteria for courses; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub instructor: Option<String>,
    pub department: Option<String>,
    pub semester: Option<Semester>,
    pub active_only: bool,
}

impl CourseFilter {
    pub fn matches(&self, course: &Course) -> bool {
        if self.active_only && !course.active {
            return false;
        }
        if let Some(instructor) = &self.instructor {
            let needle = instructor.trim().to_lowercase();
            if !course.instructor.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(department) = &self.department {
            if !course.department.eq_ignore_ascii_case(department.trim()) {
                return false;
            }
        }
        if let Some(semester) = self.semester {
            if course.semester != semester {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub course_code: String,
    pub title: String,
    pub semester: Semester,
    pub credits: u8,
    pub grade: Option<Grade>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub student: Student,
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Builds a transcript; `title_of` resolves course titles and may miss
    /// for courses removed since enrollment.
    pub fn build<F>(student: Student, enrollments: &[Enrollment], title_of: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let entries = enrollments
            .iter()
            .filter(|e| e.reg_no == student.reg_no)
            .map(|e| TranscriptEntry {
                course_code: e.course_code.clone(),
                title: title_of(&e.course_code).unwrap_or_else(|| "(unknown course)".to_string()),
                semester: e.semester,
                credits: e.credits,
                grade: e.grade,
            })
            .collect();

        Self { student, entries }
    }

    /// Credit-weighted grade point average over graded courses.
    pub fn gpa(&self) -> Option<f64> {
        let (points, credits) = self
            .entries
            .iter()
            .filter_map(|entry| entry.grade.map(|g| (g.points(), u32::from(entry.credits))))
            .fold((0u32, 0u32), |(p, c), (points, credits)| {
                (p + points * credits, c + credits)
            });

        if credits == 0 {
            None
        } else {
            Some(f64::from(points) / f64::from(credits))
        }
    }

    pub fn total_credits(&self) -> u32 {
        self.entries.iter().map(|e| u32::from(e.credits)).sum()
    }
}
