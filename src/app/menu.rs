use crate::config::AppConfig;
use crate::core::backup::BackupService;
use crate::core::import_export::{ImportExportService, ImportSummary};
use crate::domain::model::{Course, CourseFilter, Grade, Semester, Student, Transcript};
use crate::domain::ports::{CourseService, EnrollmentService, StudentService};
use crate::utils::error::{CcrmError, Result};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Raised from prompts when the input stream is exhausted.
#[derive(Debug)]
struct EndOfInput;

impl fmt::Display for EndOfInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("end of input")
    }
}

impl std::error::Error for EndOfInput {}

fn is_end_of_input(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::UnexpectedEof
        && err.get_ref().is_some_and(|inner| inner.is::<EndOfInput>())
}

struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, EndOfInput));
        }
        Ok(line.trim().to_string())
    }

    /// Blank answers become `None`.
    fn prompt_optional(&mut self, label: &str) -> io::Result<Option<String>> {
        let answer = self.prompt(label)?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    fn line(&mut self, text: impl fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    fn report<T: fmt::Display>(&mut self, result: Result<T>) -> io::Result<()> {
        match result {
            Ok(message) => writeln!(self.output, "{}", message),
            Err(e) => {
                tracing::debug!("Menu action failed: {}", e);
                writeln!(self.output, "Error: {}", e.user_friendly_message())?;
                writeln!(self.output, "  {}", e.recovery_suggestion())
            }
        }
    }
}

pub struct MenuHandler {
    students: Arc<dyn StudentService>,
    courses: Arc<dyn CourseService>,
    enrollments: Arc<dyn EnrollmentService>,
    import_export: Arc<ImportExportService>,
    backup: Arc<BackupService>,
    config: Arc<AppConfig>,
}

impl MenuHandler {
    pub fn new(
        students: Arc<dyn StudentService>,
        courses: Arc<dyn CourseService>,
        enrollments: Arc<dyn EnrollmentService>,
        import_export: Arc<ImportExportService>,
        backup: Arc<BackupService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            students,
            courses,
            enrollments,
            import_export,
            backup,
            config,
        }
    }

    /// Runs the interactive session on the process console until Exit or end of input.
    pub fn start(&self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    pub fn run_with<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<()> {
        let mut console = Console { input, output };
        match self.main_loop(&mut console) {
            Ok(()) => Ok(()),
            Err(e) if is_end_of_input(&e) => {
                tracing::debug!("Input closed, ending session");
                Ok(())
            }
            Err(e) => Err(CcrmError::IoError(e)),
        }
    }

    fn main_loop<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<()> {
        loop {
            c.line("")?;
            c.line("===== Main Menu =====")?;
            c.line("1. Manage students")?;
            c.line("2. Manage courses")?;
            c.line("3. Enrollment & grades")?;
            c.line("4. Import / export data")?;
            c.line("5. Backup")?;
            c.line("6. Show configuration")?;
            c.line("0. Exit")?;

            match c.prompt("Select an option: ")?.as_str() {
                "1" => self.student_menu(c)?,
                "2" => self.course_menu(c)?,
                "3" => self.enrollment_menu(c)?,
                "4" => self.import_export_menu(c)?,
                "5" => self.backup_menu(c)?,
                "6" => self.show_config(c)?,
                "0" => {
                    c.line("Goodbye!")?;
                    return Ok(());
                }
                other => c.line(format!("Invalid option: '{}'", other))?,
            }
        }
    }

    fn student_menu<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<()> {
        loop {
            c.line("")?;
            c.line("--- Students ---")?;
            c.line("1. Add student")?;
            c.line("2. List students")?;
            c.line("3. View student")?;
            c.line("4. Update student")?;
            c.line("5. Deactivate student")?;
            c.line("0. Back")?;

            match c.prompt("Select an option: ")?.as_str() {
                "1" => {
                    let reg_no = c.prompt("Registration number: ")?;
                    let full_name = c.prompt("Full name: ")?;
                    let email = c.prompt("Email: ")?;
                    let result = self
                        .students
                        .add_student(Student::new(reg_no.as_str(), full_name, email))
                        .map(|()| format!("Student {} added.", reg_no));
                    c.report(result)?;
                }
                "2" => self.list_students(c)?,
                "3" => {
                    let reg_no = c.prompt("Registration number: ")?;
                    match self.students.find_student(&reg_no) {
                        Some(student) => self.print_profile(c, &student)?,
                        None => c.report::<String>(Err(CcrmError::not_found("student", reg_no)))?,
                    }
                }
                "4" => {
                    let reg_no = c.prompt("Registration number: ")?;
                    let full_name = c.prompt_optional("New full name (blank to keep): ")?;
                    let email = c.prompt_optional("New email (blank to keep): ")?;
                    let result = self
                        .students
                        .update_student(&reg_no, full_name, email)
                        .map(|s| format!("Student {} updated.", s.reg_no));
                    c.report(result)?;
                }
                "5" => {
                    let reg_no = c.prompt("Registration number: ")?;
                    let result = self
                        .students
                        .deactivate_student(&reg_no)
                        .map(|()| format!("Student {} deactivated.", reg_no));
                    c.report(result)?;
                }
                "0" => return Ok(()),
                other => c.line(format!("Invalid option: '{}'", other))?,
            }
        }
    }

    fn list_students<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<()> {
        let students = self.students.list_students();
        if students.is_empty() {
            return c.line("No students found.");
        }
        for s in &students {
            c.line(format!(
                "{:<12} {:<28} {:<30} {:<8} {}",
                s.reg_no, s.full_name, s.email, s.status, s.created_on
            ))?;
        }
        c.line(format!("{} student(s).", students.len()))
    }

    fn print_profile<R: BufRead, W: Write>(
        &self,
        c: &mut Console<R, W>,
        student: &Student,
    ) -> io::Result<()> {
        c.line(format!("Registration no.: {}", student.reg_no))?;
        c.line(format!("Name:             {}", student.full_name))?;
        c.line(format!("Email:            {}", student.email))?;
        c.line(format!("Status:           {}", student.status))?;
        c.line(format!("Created on:       {}", student.created_on))?;

        let enrolled: Vec<String> = self
            .enrollments
            .enrollments_for_student(&student.reg_no)
            .into_iter()
            .map(|e| e.course_code)
            .collect();
        if enrolled.is_empty() {
            c.line("Enrolled courses: none")
        } else {
            c.line(format!("Enrolled courses: {}", enrolled.join(", ")))
        }
    }

    fn course_menu<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<()> {
        loop {
            c.line("")?;
            c.line("--- Courses ---")?;
            c.line("1. Add course")?;
            c.line("2. List courses")?;
            c.line("3. Search courses")?;
            c.line("4. Assign instructor")?;
            c.line("5. Deactivate course")?;
            c.line("0. Back")?;

            match c.prompt("Select an option: ")?.as_str() {
                "1" => {
                    let result = self.read_course(c)?.and_then(|course| {
                        let code = course.code.clone();
                        self.courses
                            .add_course(course)
                            .map(|()| format!("Course {} added.", code))
                    });
                    c.report(result)?;
                }
                "2" => {
                    let courses = self.courses.list_courses();
                    self.print_courses(c, &courses)?;
                }
                "3" => {
                    let filter = self.read_filter(c)?;
                    match filter {
                        Ok(filter) => {
                            let courses = self.courses.search_courses(&filter);
                            self.print_courses(c, &courses)?;
                        }
                        Err(e) => c.report::<String>(Err(e))?,
                    }
                }
                "4" => {
                    let code = c.prompt("Course code: ")?;
                    let instructor = c.prompt("Instructor: ")?;
                    let result = self
                        .courses
                        .assign_instructor(&code, &instructor)
                        .map(|course| format!("{} is now taught by {}.", course.code, course.instructor));
                    c.report(result)?;
                }
                "5" => {
                    let code = c.prompt("Course code: ")?;
                    let result = self
                        .courses
                        .deactivate_course(&code)
                        .map(|()| format!("Course {} deactivated.", code.to_ascii_uppercase()));
                    c.report(result)?;
                }
                "0" => return Ok(()),
                other => c.line(format!("Invalid option: '{}'", other))?,
            }
        }
    }

    fn read_course<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<Result<Course>> {
        let code = c.prompt("Course code: ")?;
        let title = c.prompt("Title: ")?;
        let credits = c.prompt("Credits: ")?;
        let department = c.prompt("Department: ")?;
        let semester = c.prompt("Semester (spring/summer/fall): ")?;
        let instructor = c.prompt("Instructor (optional): ")?;

        let credits = match credits.parse::<u8>() {
            Ok(credits) => credits,
            Err(_) => {
                return Ok(Err(CcrmError::validation(format!(
                    "credits must be a whole number, got '{}'",
                    credits
                ))))
            }
        };

        Ok(semester.parse::<Semester>().map(|semester| {
            Course::new(code, title, credits, department, semester).with_instructor(instructor)
        }))
    }

    fn read_filter<R: BufRead, W: Write>(
        &self,
        c: &mut Console<R, W>,
    ) -> io::Result<Result<CourseFilter>> {
        let instructor = c.prompt_optional("Instructor contains (blank for any): ")?;
        let department = c.prompt_optional("Department (blank for any): ")?;
        let semester = c.prompt_optional("Semester (blank for any): ")?;
        let active_only = c.prompt("Active courses only? (y/n): ")?;

        let semester = match semester.map(|s| s.parse::<Semester>()).transpose() {
            Ok(semester) => semester,
            Err(e) => return Ok(Err(e)),
        };

        Ok(Ok(CourseFilter {
            instructor,
            department,
            semester,
            active_only: active_only.eq_ignore_ascii_case("y"),
        }))
    }

    fn print_courses<R: BufRead, W: Write>(
        &self,
        c: &mut Console<R, W>,
        courses: &[Course],
    ) -> io::Result<()> {
        if courses.is_empty() {
            return c.line("No courses found.");
        }
        for course in courses {
            c.line(format!(
                "{:<8} {:<30} {:>2}cr {:<10} {:<8} {:<20} {}",
                course.code,
                course.title,
                course.credits,
                course.department,
                course.semester,
                if course.instructor.is_empty() {
                    "(unassigned)"
                } else {
                    course.instructor.as_str()
                },
                if course.active { "active" } else { "inactive" }
            ))?;
        }
        c.line(format!("{} course(s).", courses.len()))
    }

    fn enrollment_menu<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<()> {
        loop {
            c.line("")?;
            c.line("--- Enrollment & Grades ---")?;
            c.line("1. Enroll student in course")?;
            c.line("2. Unenroll student from course")?;
            c.line("3. Record grade")?;
            c.line("4. Show transcript")?;
            c.line("0. Back")?;

            match c.prompt("Select an option: ")?.as_str() {
                "1" => {
                    let reg_no = c.prompt("Registration number: ")?;
                    let code = c.prompt("Course code: ")?;
                    let result = self.enroll(&reg_no, &code);
                    c.report(result)?;
                }
                "2" => {
                    let reg_no = c.prompt("Registration number: ")?;
                    let code = c.prompt("Course code: ")?;
                    let result = self
                        .enrollments
                        .unenroll(&reg_no, &code)
                        .map(|()| format!("{} unenrolled from {}.", reg_no, code.to_ascii_uppercase()));
                    c.report(result)?;
                }
                "3" => {
                    let reg_no = c.prompt("Registration number: ")?;
                    let code = c.prompt("Course code: ")?;
                    let grade = c.prompt("Grade (S/A/B/C/D/E/F): ")?;
                    let result = grade.parse::<Grade>().and_then(|grade| {
                        self.enrollments
                            .record_grade(&reg_no, &code, grade)
                            .map(|()| format!("Recorded {} for {} in {}.", grade, reg_no, code.to_ascii_uppercase()))
                    });
                    c.report(result)?;
                }
                "4" => {
                    let reg_no = c.prompt("Registration number: ")?;
                    match self.transcript(&reg_no) {
                        Ok(transcript) => self.print_transcript(c, &transcript)?,
                        Err(e) => c.report::<String>(Err(e))?,
                    }
                }
                "0" => return Ok(()),
                other => c.line(format!("Invalid option: '{}'", other))?,
            }
        }
    }

    fn enroll(&self, reg_no: &str, code: &str) -> Result<String> {
        let student = self
            .students
            .find_student(reg_no)
            .ok_or_else(|| CcrmError::not_found("student", reg_no.trim()))?;
        let course = self
            .courses
            .find_course(code)
            .ok_or_else(|| CcrmError::not_found("course", code.trim()))?;

        let enrollment = self.enrollments.enroll(&student, &course)?;
        Ok(format!(
            "Enrolled {} in {} ({}).",
            enrollment.reg_no, enrollment.course_code, enrollment.semester
        ))
    }

    fn transcript(&self, reg_no: &str) -> Result<Transcript> {
        let student = self
            .students
            .find_student(reg_no)
            .ok_or_else(|| CcrmError::not_found("student", reg_no.trim()))?;
        let enrollments = self.enrollments.enrollments_for_student(&student.reg_no);
        Ok(Transcript::build(student, &enrollments, |code| {
            self.courses.find_course(code).map(|course| course.title)
        }))
    }

    fn print_transcript<R: BufRead, W: Write>(
        &self,
        c: &mut Console<R, W>,
        transcript: &Transcript,
    ) -> io::Result<()> {
        c.line(format!(
            "Transcript for {} ({})",
            transcript.student.full_name, transcript.student.reg_no
        ))?;
        if transcript.entries.is_empty() {
            c.line("No enrollments.")?;
        }
        for entry in &transcript.entries {
            let grade = entry
                .grade
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".to_string());
            c.line(format!(
                "{:<8} {:<30} {:<8} {:>2}cr  {}",
                entry.course_code, entry.title, entry.semester, entry.credits, grade
            ))?;
        }
        c.line(format!("Total credits: {}", transcript.total_credits()))?;
        match transcript.gpa() {
            Some(gpa) => c.line(format!("GPA: {:.2}", gpa)),
            None => c.line("GPA: n/a"),
        }
    }

    fn import_export_menu<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<()> {
        loop {
            c.line("")?;
            c.line("--- Import / Export ---")?;
            c.line("1. Import students from CSV")?;
            c.line("2. Import courses from CSV")?;
            c.line("3. Import enrollments from CSV")?;
            c.line("4. Import all from data directory")?;
            c.line("5. Export all to data directory")?;
            c.line("0. Back")?;

            match c.prompt("Select an option: ")?.as_str() {
                "1" => {
                    let path = PathBuf::from(c.prompt("CSV path: ")?);
                    let result = self.import_export.import_students(&path).map(describe_import);
                    c.report(result)?;
                }
                "2" => {
                    let path = PathBuf::from(c.prompt("CSV path: ")?);
                    let result = self.import_export.import_courses(&path).map(describe_import);
                    c.report(result)?;
                }
                "3" => {
                    let path = PathBuf::from(c.prompt("CSV path: ")?);
                    let result = self
                        .import_export
                        .import_enrollments(&path)
                        .map(describe_import);
                    c.report(result)?;
                }
                "4" => {
                    let result = self
                        .import_export
                        .import_all(&self.config.data_dir)
                        .map(describe_import);
                    c.report(result)?;
                }
                "5" => {
                    let result = self
                        .import_export
                        .export_all(&self.config.data_dir)
                        .map(|paths| {
                            let names: Vec<String> =
                                paths.iter().map(|p| p.display().to_string()).collect();
                            format!("Exported: {}", names.join(", "))
                        });
                    c.report(result)?;
                }
                "0" => return Ok(()),
                other => c.line(format!("Invalid option: '{}'", other))?,
            }
        }
    }

    fn backup_menu<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<()> {
        loop {
            c.line("")?;
            c.line("--- Backup ---")?;
            c.line("1. Create backup")?;
            c.line("2. List backups")?;
            c.line("3. Show backup directory size")?;
            c.line("4. Restore backup")?;
            c.line("0. Back")?;

            match c.prompt("Select an option: ")?.as_str() {
                "1" => {
                    let result = self
                        .backup
                        .create_backup()
                        .map(|info| format!("Backup created: {} ({} bytes)", info.name, info.size_bytes));
                    c.report(result)?;
                }
                "2" => match self.backup.list_backups() {
                    Ok(backups) if backups.is_empty() => c.line("No backups found.")?,
                    Ok(backups) => {
                        for info in backups {
                            c.line(format!("{:<36} {:>10} bytes", info.name, info.size_bytes))?;
                        }
                    }
                    Err(e) => c.report::<String>(Err(e))?,
                },
                "3" => {
                    let result = self.backup.total_size().map(|size| {
                        format!(
                            "{} uses {} bytes.",
                            self.backup.backup_dir().display(),
                            size
                        )
                    });
                    c.report(result)?;
                }
                "4" => {
                    let name = c.prompt("Backup name: ")?;
                    let result = self.backup.restore_backup(&name).map(|s| {
                        format!(
                            "Restored students {}/{}, courses {}/{}, enrollments {}/{} (imported/skipped).",
                            s.students.imported,
                            s.students.skipped,
                            s.courses.imported,
                            s.courses.skipped,
                            s.enrollments.imported,
                            s.enrollments.skipped
                        )
                    });
                    c.report(result)?;
                }
                "0" => return Ok(()),
                other => c.line(format!("Invalid option: '{}'", other))?,
            }
        }
    }

    fn show_config<R: BufRead, W: Write>(&self, c: &mut Console<R, W>) -> io::Result<()> {
        c.line(format!("Data directory:   {}", self.config.data_dir.display()))?;
        c.line(format!("Backup directory: {}", self.config.backup_dir.display()))?;
        c.line(format!("Debug mode:       {}", self.config.debug_mode))
    }
}

fn describe_import(summary: ImportSummary) -> String {
    format!(
        "Imported {} record(s), skipped {}.",
        summary.imported, summary.skipped
    )
}
