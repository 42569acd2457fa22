/// Instruction sent alongside every score sheet image.
///
/// The model must leave out scores that were altered without a signature or
/// stamp, and reply with bare JSON.
pub const SHEET_PROMPT: &str = r#"You are a teaching assistant. Analyse this photo of a student's score registration sheet.

Tasks:
1. Read the student's seat number.
2. Read every score recorded for this student.

Rules for altered scores:
- Check every score carefully.
- If a score has been crossed out or overwritten, look for a signature or stamp next to it.
- An altered score WITHOUT a signature or stamp is invalid. Leave it out.
- An altered score WITH a signature or stamp counts at its corrected value.

Reply with JSON only, no markdown, in exactly this shape:
{
    "seat_number": "seat number",
    "valid_scores": [score1, score2, score3]
}"#;
