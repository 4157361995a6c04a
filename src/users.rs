use crate::model::{timestamp_id, DomainError, Role, Student, Teacher};
use crate::store::{self, RecordStore, STUDENTS, TEACHERS};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub voice_over_enabled: bool,
}

#[derive(Debug, Clone)]
pub enum UserRecord {
    Student(Student),
    Teacher(Teacher),
}

impl UserRecord {
    pub fn id(&self) -> &str {
        match self {
            UserRecord::Student(s) => &s.id,
            UserRecord::Teacher(t) => &t.id,
        }
    }

    /// The record as handed back over IPC. Passwords stay in the store and
    /// never travel in responses.
    pub fn public_profile(&self) -> serde_json::Value {
        let mut value = match self {
            UserRecord::Student(s) => serde_json::to_value(s),
            UserRecord::Teacher(t) => serde_json::to_value(t),
        }
        .unwrap_or_else(|_| serde_json::json!({}));
        if let Some(obj) = value.as_object_mut() {
            obj.remove("password");
        }
        value
    }
}

pub fn student_public_profile(student: &Student) -> serde_json::Value {
    UserRecord::Student(student.clone()).public_profile()
}

fn required_text(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Creates a student or teacher account. Email must be unique within the
/// role's collection; student roll numbers must be unique among students.
/// Nothing is persisted when a check fails.
pub fn register(store: &dyn RecordStore, reg: &Registration) -> Result<UserRecord, DomainError> {
    let name = required_text("name", &reg.name)?;
    let email = required_text("email", &reg.email)?;
    let password = required_text("password", &reg.password)?;

    match reg.role {
        Role::Student => {
            let roll_number =
                required_text("rollNumber", reg.roll_number.as_deref().unwrap_or(""))?;
            let mut students: Vec<Student> = store::read_records(store, STUDENTS)?;
            if students.iter().any(|s| s.email == email) {
                return Err(DomainError::conflict("email already registered"));
            }
            if students.iter().any(|s| s.roll_number == roll_number) {
                return Err(DomainError::conflict("roll number already registered"));
            }
            let id = timestamp_id(Role::Student.id_prefix(), |id| {
                students.iter().any(|s| s.id == id)
            });
            let student = Student {
                id,
                name,
                email,
                password,
                roll_number,
                voice_over_enabled: reg.voice_over_enabled,
            };
            students.push(student.clone());
            store::write_records(store, STUDENTS, &students)?;
            Ok(UserRecord::Student(student))
        }
        Role::Teacher => {
            let mut teachers: Vec<Teacher> = store::read_records(store, TEACHERS)?;
            if teachers.iter().any(|t| t.email == email) {
                return Err(DomainError::conflict("email already registered"));
            }
            let id = timestamp_id(Role::Teacher.id_prefix(), |id| {
                teachers.iter().any(|t| t.id == id)
            });
            let teacher = Teacher {
                id,
                name,
                email,
                password,
            };
            teachers.push(teacher.clone());
            store::write_records(store, TEACHERS, &teachers)?;
            Ok(UserRecord::Teacher(teacher))
        }
    }
}

/// Plaintext credential lookup. Suitable for a demo deployment only; a real
/// one needs hashing in front of this store.
pub fn authenticate(
    store: &dyn RecordStore,
    role: Role,
    email: &str,
    password: &str,
) -> Result<UserRecord, DomainError> {
    let miss = || DomainError::new("auth_failed", "invalid email or password");
    match role {
        Role::Student => {
            let students: Vec<Student> = store::read_records(store, STUDENTS)?;
            students
                .into_iter()
                .find(|s| s.email == email && s.password == password)
                .map(UserRecord::Student)
                .ok_or_else(miss)
        }
        Role::Teacher => {
            let teachers: Vec<Teacher> = store::read_records(store, TEACHERS)?;
            teachers
                .into_iter()
                .find(|t| t.email == email && t.password == password)
                .map(UserRecord::Teacher)
                .ok_or_else(miss)
        }
    }
}

pub fn list_students(store: &dyn RecordStore) -> Result<Vec<Student>, DomainError> {
    store::read_records(store, STUDENTS)
}

pub fn find_student(store: &dyn RecordStore, student_id: &str) -> Result<Student, DomainError> {
    let students: Vec<Student> = store::read_records(store, STUDENTS)?;
    students
        .into_iter()
        .find(|s| s.id == student_id)
        .ok_or_else(|| DomainError::not_found("student not found"))
}

pub fn find_student_by_roll(
    store: &dyn RecordStore,
    roll_number: &str,
) -> Result<Student, DomainError> {
    let students: Vec<Student> = store::read_records(store, STUDENTS)?;
    students
        .into_iter()
        .find(|s| s.roll_number == roll_number)
        .ok_or_else(|| DomainError::not_found("no student with this roll number"))
}

/// The only user mutation in the system: the owning student toggling the
/// narration preference.
pub fn set_voice_over(
    store: &dyn RecordStore,
    student_id: &str,
    enabled: bool,
) -> Result<Student, DomainError> {
    let mut students: Vec<Student> = store::read_records(store, STUDENTS)?;
    let Some(student) = students.iter_mut().find(|s| s.id == student_id) else {
        return Err(DomainError::not_found("student not found"));
    };
    student.voice_over_enabled = enabled;
    let updated = student.clone();
    store::write_records(store, STUDENTS, &students)?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn student_reg(name: &str, email: &str, roll: &str) -> Registration {
        Registration {
            role: Role::Student,
            name: name.to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
            roll_number: Some(roll.to_string()),
            voice_over_enabled: false,
        }
    }

    #[test]
    fn register_then_login_round_trip() {
        let store = MemoryStore::new();
        let created = register(&store, &student_reg("Asha Verma", "asha@school.test", "R-001"))
            .expect("register");
        assert!(created.id().starts_with("student_"));

        let user = authenticate(&store, Role::Student, "asha@school.test", "secret")
            .expect("authenticate");
        assert_eq!(user.id(), created.id());

        let err = authenticate(&store, Role::Student, "asha@school.test", "wrong")
            .expect_err("bad password");
        assert_eq!(err.code, "auth_failed");
    }

    #[test]
    fn duplicate_roll_number_conflicts_and_leaves_collection_unchanged() {
        let store = MemoryStore::new();
        register(&store, &student_reg("Asha Verma", "asha@school.test", "R-001"))
            .expect("first register");

        let err = register(&store, &student_reg("Rohan Gupta", "rohan@school.test", "R-001"))
            .expect_err("duplicate roll number");
        assert_eq!(err.code, "conflict");

        let students = list_students(&store).expect("list");
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Asha Verma");
    }

    #[test]
    fn duplicate_email_is_scoped_to_the_role() {
        let store = MemoryStore::new();
        register(&store, &student_reg("Asha Verma", "shared@school.test", "R-001"))
            .expect("student register");

        // Same email as a teacher lives in a different collection.
        let teacher = Registration {
            role: Role::Teacher,
            name: "Meera Iyer".to_string(),
            email: "shared@school.test".to_string(),
            password: "secret".to_string(),
            roll_number: None,
            voice_over_enabled: false,
        };
        register(&store, &teacher).expect("teacher register");

        let err = register(&store, &student_reg("Rohan Gupta", "shared@school.test", "R-002"))
            .expect_err("duplicate student email");
        assert_eq!(err.code, "conflict");
    }

    #[test]
    fn public_profile_never_carries_the_password() {
        let store = MemoryStore::new();
        let created = register(&store, &student_reg("Asha Verma", "asha@school.test", "R-001"))
            .expect("register");
        let profile = created.public_profile();
        assert!(profile.get("password").is_none());
        assert_eq!(profile["rollNumber"], "R-001");
    }

    #[test]
    fn voice_over_toggle_persists() {
        let store = MemoryStore::new();
        let created = register(&store, &student_reg("Asha Verma", "asha@school.test", "R-001"))
            .expect("register");
        let updated = set_voice_over(&store, created.id(), true).expect("toggle");
        assert!(updated.voice_over_enabled);
        let reloaded = find_student(&store, created.id()).expect("find");
        assert!(reloaded.voice_over_enabled);
    }

    #[test]
    fn missing_roll_number_is_a_validation_error() {
        let store = MemoryStore::new();
        let mut reg = student_reg("Asha Verma", "asha@school.test", "R-001");
        reg.roll_number = None;
        let err = register(&store, &reg).expect_err("missing roll number");
        assert_eq!(err.code, "validation");
    }
}
