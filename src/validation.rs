//! Input validation shared by the auth and quiz routes.

use crate::constants::{MAX_ANSWER_LEN, MAX_NAME_LEN, MAX_STUDENT_ID_LEN};

pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err("Name is too long");
    }
    Ok(())
}

pub fn validate_student_id(student_id: &str) -> Result<(), &'static str> {
    let trimmed = student_id.trim();
    if trimmed.is_empty() {
        return Err("Student id must not be empty");
    }
    if trimmed.chars().count() > MAX_STUDENT_ID_LEN {
        return Err("Student id is too long");
    }
    Ok(())
}

/// Answers may legitimately be empty (a blank submission is just wrong), but
/// are length-capped to keep junk out of the sheet.
pub fn validate_answer(answer: &str) -> Result<(), &'static str> {
    if answer.chars().count() > MAX_ANSWER_LEN {
        return Err("Answer is too long");
    }
    Ok(())
}
