use crate::core::contact_store::ContactStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    /// Full instructions plus the contact table, for a base model.
    #[default]
    Guided,
    /// The `Instruction: ...\nOutput: ` format the adapter was fine-tuned on.
    Instruction,
}

pub fn build_prompt(style: PromptStyle, request: &str, contacts: &ContactStore) -> String {
    match style {
        PromptStyle::Guided => guided_prompt(request, contacts),
        PromptStyle::Instruction => instruction_prompt(request),
    }
}

pub fn instruction_prompt(instruction: &str) -> String {
    format!("Instruction: {}\nOutput: ", instruction)
}

/// One training line: the instruction prompt followed by the compact JSON answer.
pub fn training_text(instruction: &str, output: &serde_json::Value) -> String {
    format!("{}{}", instruction_prompt(instruction), output)
}

fn guided_prompt(request: &str, contacts: &ContactStore) -> String {
    format!(
        r#"Give me ONLY EXACTLY one JSON object. No explanations, no quotes, no markdown fences, no extra text.
You have access to the following contacts: {contacts}
Request: "{request}"
Output only one JSON object based on the Request:
Case1: If it's a contact update: {{"type":"update","action":"add/update/delete","name":"...","email":"..."}}
Example output: {{"type":"update","action":"add","name":"jim","email":"jim@example.com"}}
Case2: If it's an email: {{"type":"email","receiver":"<actual email address>","subject":"...","body":"..."}}
Example output: {{"type":"email","receiver":"alice@example.com","subject":"hello","body":"hi"}}
"#,
        contacts = render_contacts(contacts),
        request = request,
    )
}

fn render_contacts(contacts: &ContactStore) -> String {
    let table: serde_json::Map<String, serde_json::Value> = contacts
        .iter()
        .map(|(name, email)| (name.to_string(), email.as_str().into()))
        .collect();
    serde_json::Value::Object(table).to_string()
}
