use crate::domain::model::{Course, Enrollment, Student};
use crate::domain::ports::{CourseService, EnrollmentService, StudentService};
use crate::utils::error::{CcrmError, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const STUDENTS_FILE: &str = "students.csv";
pub const COURSES_FILE: &str = "courses.csv";
pub const ENROLLMENTS_FILE: &str = "enrollments.csv";

/// One rendered CSV file, ready to be written to disk or an archive.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub name: &'static str,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn merge(&mut self, other: ImportSummary) {
        self.imported += other.imported;
        self.skipped += other.skipped;
    }
}

/// Which record table a CSV file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Students,
    Courses,
    Enrollments,
}

impl RecordKind {
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Students => STUDENTS_FILE,
            RecordKind::Courses => COURSES_FILE,
            RecordKind::Enrollments => ENROLLMENTS_FILE,
        }
    }

    /// Column names written on the first line of each file.
    pub fn header(self) -> &'static [&'static str] {
        match self {
            RecordKind::Students => &["reg_no", "full_name", "email", "status", "created_on"],
            RecordKind::Courses => &[
                "code",
                "title",
                "credits",
                "instructor",
                "department",
                "semester",
                "active",
            ],
            RecordKind::Enrollments => &[
                "reg_no",
                "course_code",
                "semester",
                "credits",
                "enrolled_on",
                "grade",
            ],
        }
    }

    /// Import order: enrollments reference both other tables.
    pub const IMPORT_ORDER: [RecordKind; 3] = [
        RecordKind::Students,
        RecordKind::Courses,
        RecordKind::Enrollments,
    ];
}

pub struct ImportExportService {
    students: Arc<dyn StudentService>,
    courses: Arc<dyn CourseService>,
    enrollments: Arc<dyn EnrollmentService>,
}

impl ImportExportService {
    pub fn new(
        students: Arc<dyn StudentService>,
        courses: Arc<dyn CourseService>,
        enrollments: Arc<dyn EnrollmentService>,
    ) -> Self {
        Self {
            students,
            courses,
            enrollments,
        }
    }

    /// Renders all three tables as CSV in memory.
    pub fn render_snapshot(&self) -> Result<Vec<ExportFile>> {
        Ok(vec![
            ExportFile {
                name: STUDENTS_FILE,
                contents: to_csv(RecordKind::Students, &self.students.list_students())?,
            },
            ExportFile {
                name: COURSES_FILE,
                contents: to_csv(RecordKind::Courses, &self.courses.list_courses())?,
            },
            ExportFile {
                name: ENROLLMENTS_FILE,
                contents: to_csv(RecordKind::Enrollments, &self.enrollments.list_enrollments())?,
            },
        ])
    }

    pub fn export_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for file in self.render_snapshot()? {
            let path = dir.join(file.name);
            fs::write(&path, &file.contents)?;
            tracing::debug!("Wrote {} ({} bytes)", path.display(), file.contents.len());
            written.push(path);
        }

        tracing::info!("Exported {} files to {}", written.len(), dir.display());
        Ok(written)
    }

    pub fn import_students(&self, path: &Path) -> Result<ImportSummary> {
        self.import_students_from_reader(fs::File::open(path)?)
    }

    pub fn import_courses(&self, path: &Path) -> Result<ImportSummary> {
        self.import_courses_from_reader(fs::File::open(path)?)
    }

    pub fn import_enrollments(&self, path: &Path) -> Result<ImportSummary> {
        self.import_enrollments_from_reader(fs::File::open(path)?)
    }

    pub fn import_students_from_reader<R: Read>(&self, reader: R) -> Result<ImportSummary> {
        import_rows::<Student, _, _>(reader, "student", |student| {
            self.students.add_student(student)
        })
    }

    pub fn import_courses_from_reader<R: Read>(&self, reader: R) -> Result<ImportSummary> {
        import_rows::<Course, _, _>(reader, "course", |course| self.courses.add_course(course))
    }

    pub fn import_enrollments_from_reader<R: Read>(&self, reader: R) -> Result<ImportSummary> {
        import_rows::<Enrollment, _, _>(reader, "enrollment", |mut enrollment| {
            if self.students.find_student(&enrollment.reg_no).is_none() {
                return Err(CcrmError::not_found("student", enrollment.reg_no));
            }
            let course = self
                .courses
                .find_course(&enrollment.course_code)
                .ok_or_else(|| CcrmError::not_found("course", enrollment.course_code.clone()))?;

            // semester and credits always come from the course
            if enrollment.semester != course.semester || enrollment.credits != course.credits {
                tracing::warn!(
                    "Enrollment {}/{} lists {} {}cr, using course values {} {}cr",
                    enrollment.reg_no,
                    course.code,
                    enrollment.semester,
                    enrollment.credits,
                    course.semester,
                    course.credits
                );
            }
            enrollment.course_code = course.code;
            enrollment.semester = course.semester;
            enrollment.credits = course.credits;
            self.enrollments.restore_enrollment(enrollment)
        })
    }

    pub fn import_kind_from_reader<R: Read>(
        &self,
        kind: RecordKind,
        reader: R,
    ) -> Result<ImportSummary> {
        match kind {
            RecordKind::Students => self.import_students_from_reader(reader),
            RecordKind::Courses => self.import_courses_from_reader(reader),
            RecordKind::Enrollments => self.import_enrollments_from_reader(reader),
        }
    }

    /// Imports every known file present in `dir`; missing files are skipped.
    pub fn import_all(&self, dir: &Path) -> Result<ImportSummary> {
        let mut total = ImportSummary::default();
        for kind in RecordKind::IMPORT_ORDER {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                tracing::debug!("No {} in {}, skipping", kind.file_name(), dir.display());
                continue;
            }
            total.merge(self.import_kind_from_reader(kind, fs::File::open(&path)?)?);
        }
        Ok(total)
    }
}

fn to_csv<T: Serialize>(kind: RecordKind, rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(kind.header())?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| CcrmError::IoError(e.into_error()))
}

fn import_rows<T, R, F>(reader: R, entity: &str, mut insert: F) -> Result<ImportSummary>
where
    T: DeserializeOwned,
    R: Read,
    F: FnMut(T) -> Result<()>,
{
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut summary = ImportSummary::default();

    for (index, row) in csv_reader.deserialize::<T>().enumerate() {
        // header is line 1
        let line = index + 2;
        let record = match row {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping {} row at line {}: {}", entity, line, e);
                summary.skipped += 1;
                continue;
            }
        };

        match insert(record) {
            Ok(()) => summary.imported += 1,
            Err(e) => {
                tracing::warn!("Rejected {} row at line {}: {}", entity, line, e);
                summary.skipped += 1;
            }
        }
    }

    tracing::info!(
        "Imported {} {} rows ({} skipped)",
        summary.imported,
        entity,
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::{
        InMemoryCourseService, InMemoryEnrollmentService, InMemoryStudentService,
    };
    use crate::domain::model::{Grade, Semester};
    use tempfile::TempDir;

    fn empty_service() -> ImportExportService {
        ImportExportService::new(
            Arc::new(InMemoryStudentService::new()),
            Arc::new(InMemoryCourseService::new()),
            Arc::new(InMemoryEnrollmentService::new()),
        )
    }

    #[test]
    fn test_import_students_skips_bad_rows() {
        let service = empty_service();
        let data = "reg_no,full_name,email,status,created_on\n\
                    R001,Ada Lovelace,ada@uni.edu,active,2024-01-15\n\
                    R002,Alan Turing,not-an-email,active,2024-01-15\n\
                    R001,Ada Again,ada2@uni.edu,active,2024-01-15\n\
                    R003,Grace Hopper,grace@uni.edu,retired,2024-01-15\n\
                    R004 , Edsger Dijkstra ,ed@uni.edu,inactive,2023-09-01\n";

        let summary = service.import_students_from_reader(data.as_bytes()).unwrap();

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 3);
        let r004 = service.students.find_student("R004").unwrap();
        assert_eq!(r004.full_name, "Edsger Dijkstra");
        assert!(!r004.is_active());
    }

    #[test]
    fn test_enrollment_import_requires_known_student_and_course() {
        let service = empty_service();
        service
            .students
            .add_student(Student::new("R001", "Ada", "ada@uni.edu"))
            .unwrap();
        service
            .courses
            .add_course(Course::new("CS101", "Programming", 4, "CSE", Semester::Fall))
            .unwrap();

        let data = "reg_no,course_code,semester,credits,enrolled_on,grade\n\
                    R001,cs101,fall,4,2024-08-20,A\n\
                    R404,CS101,fall,4,2024-08-20,\n\
                    R001,MA101,fall,3,2024-08-20,\n";

        let summary = service
            .import_enrollments_from_reader(data.as_bytes())
            .unwrap();
        assert_eq!(summary, ImportSummary { imported: 1, skipped: 2 });

        let enrollments = service.enrollments.list_enrollments();
        assert_eq!(enrollments[0].course_code, "CS101");
        assert_eq!(enrollments[0].grade, Some(Grade::A));
    }

    #[test]
    fn test_export_then_import_into_fresh_services() {
        let temp_dir = TempDir::new().unwrap();
        let source = empty_service();
        let student = Student::new("R001", "Ada", "ada@uni.edu");
        let course =
            Course::new("CS101", "Programming", 4, "CSE", Semester::Fall).with_instructor("Hopper");
        source.students.add_student(student.clone()).unwrap();
        source.courses.add_course(course.clone()).unwrap();
        source.enrollments.enroll(&student, &course).unwrap();
        source
            .enrollments
            .record_grade("R001", "CS101", Grade::S)
            .unwrap();

        let written = source.export_all(temp_dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        let header = fs::read_to_string(temp_dir.path().join(COURSES_FILE)).unwrap();
        assert!(header.starts_with("code,title,credits,instructor,department,semester,active"));

        let target = empty_service();
        let summary = target.import_all(temp_dir.path()).unwrap();
        assert_eq!(summary, ImportSummary { imported: 3, skipped: 0 });
        assert_eq!(target.courses.find_course("CS101").unwrap(), course);
        assert_eq!(
            target.enrollments.enrollments_for_student("R001")[0].grade,
            Some(Grade::S)
        );
    }

    #[test]
    fn test_enrollment_import_takes_semester_and_credits_from_course() {
        let service = empty_service();
        service
            .students
            .add_student(Student::new("R001", "Ada", "ada@uni.edu"))
            .unwrap();
        service
            .courses
            .add_course(Course::new("CS101", "Programming", 4, "CSE", Semester::Fall))
            .unwrap();

        let data = "reg_no,course_code,semester,credits,enrolled_on,grade\n\
                    R001,CS101,spring,200,2024-08-20,\n";
        let summary = service
            .import_enrollments_from_reader(data.as_bytes())
            .unwrap();
        assert_eq!(summary.imported, 1);

        let stored = &service.enrollments.list_enrollments()[0];
        assert_eq!(stored.semester, Semester::Fall);
        assert_eq!(stored.credits, 4);
    }

    #[test]
    fn test_import_accepts_menu_spellings_of_grade_and_semester() {
        let service = empty_service();
        service
            .students
            .add_student(Student::new("R001", "Ada", "ada@uni.edu"))
            .unwrap();

        let courses = "code,title,credits,instructor,department,semester,active\n\
                       CS101,Programming,4,,CSE,Autumn,true\n";
        service.import_courses_from_reader(courses.as_bytes()).unwrap();
        assert_eq!(
            service.courses.find_course("CS101").unwrap().semester,
            Semester::Fall
        );

        let data = "reg_no,course_code,semester,credits,enrolled_on,grade\n\
                    R001,CS101,Fall,4,2024-08-20,a\n";
        let summary = service
            .import_enrollments_from_reader(data.as_bytes())
            .unwrap();
        assert_eq!(summary, ImportSummary { imported: 1, skipped: 0 });
        assert_eq!(
            service.enrollments.list_enrollments()[0].grade,
            Some(Grade::A)
        );
    }

    #[test]
    fn test_empty_tables_still_export_headers() {
        let service = empty_service();
        let snapshot = service.render_snapshot().unwrap();
        assert_eq!(snapshot.len(), 3);

        for (file, kind) in snapshot.iter().zip(RecordKind::IMPORT_ORDER) {
            assert_eq!(file.name, kind.file_name());
            let text = String::from_utf8(file.contents.clone()).unwrap();
            assert_eq!(text.lines().count(), 1);
            assert_eq!(text.lines().next().unwrap(), kind.header().join(","));
        }
        let students = String::from_utf8(snapshot[0].contents.clone()).unwrap();
        assert_eq!(students, "reg_no,full_name,email,status,created_on\n");
    }

    #[test]
    fn test_import_missing_file_is_io_error() {
        let service = empty_service();
        let err = service
            .import_students(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, CcrmError::IoError(_)));
    }

    #[test]
    fn test_import_all_skips_absent_files() {
        let temp_dir = TempDir::new().unwrap();
        let service = empty_service();
        assert_eq!(
            service.import_all(temp_dir.path()).unwrap(),
            ImportSummary::default()
        );
    }
}
