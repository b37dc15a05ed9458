//! Synthetic instruction/output pairs for fine-tuning the parsing adapter.
//!
//! Every example's `output` is a [`ParsedIntent`], so the JSONL file can be
//! read back through the same classifier used at request time.

use crate::core::classifier::try_classify;
use crate::domain::model::{
    ContactAction, ContactUpdateIntent, DatasetExample, EmailAddress, EmailIntent, ParsedIntent,
};
use crate::utils::error::{MailError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub const NAMES: &[&str] = &[
    "alice",
    "bob",
    "caixintong",
    "jim",
    "tom",
    "susan",
    "mike",
    "linda",
    "kevin",
    "sarah",
];

pub const DOMAINS: &[&str] = &[
    "gs.ncku.edu.tw",
    "gmail.com",
    "company.com",
    "student.ncku.edu.tw",
    "example.com",
];

pub const SUBJECTS: &[&str] = &[
    "Meeting tomorrow",
    "Project kickoff",
    "Reschedule request",
    "Agenda attached",
    "Welcome aboard",
    "Check-in",
    "PR approved",
    "Thanks",
    "Reminder",
    "Follow-up",
];

pub const BODIES: &[&str] = &[
    "Let's meet at 10am.",
    "We have started the project.",
    "Can we move to next Monday?",
    "Please review the agenda.",
    "Great to have you with us.",
    "Let's touch base at noon.",
    "Your PR is approved, great work!",
    "Appreciate your help on this.",
    "Don't forget the deadline.",
    "Looking forward to your reply.",
];

pub struct DatasetGenerator<R: Rng> {
    rng: R,
}

impl DatasetGenerator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> DatasetGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items[self.rng.gen_range(0..items.len())]
    }

    fn random_email(&mut self, name: &str) -> Result<EmailAddress> {
        let domain = self.pick(DOMAINS);
        Ok(EmailAddress::parse(format!("{}@{}", name, domain))?)
    }

    pub fn update_example(&mut self, name: &str) -> Result<DatasetExample> {
        let action = ContactAction::ALL[self.rng.gen_range(0..ContactAction::ALL.len())];
        let email = self.random_email(name)?;

        let instruction = match action {
            ContactAction::Add => format!("Add {} with email {}", name, email),
            ContactAction::Update => format!("Update {}'s email to {}", name, email),
            ContactAction::Delete => format!("Delete {} from contacts", name),
        };

        Ok(DatasetExample {
            instruction,
            output: ParsedIntent::ContactUpdate(ContactUpdateIntent {
                action,
                name: name.to_string(),
                email,
            }),
        })
    }

    pub fn email_example(&mut self, name: &str) -> Result<DatasetExample> {
        let receiver = self.random_email(name)?;
        let subject = self.pick(SUBJECTS);
        let body = self.pick(BODIES);

        Ok(DatasetExample {
            instruction: format!("Send {} an email saying {}", name, body),
            output: ParsedIntent::Email(EmailIntent {
                receiver,
                subject: subject.to_string(),
                body: body.to_string(),
            }),
        })
    }

    /// Half contact updates, half emails.
    pub fn example(&mut self) -> Result<DatasetExample> {
        let name = self.pick(NAMES);
        if self.rng.gen_bool(0.5) {
            self.update_example(name)
        } else {
            self.email_example(name)
        }
    }

    pub fn generate(&mut self, count: usize) -> Result<Vec<DatasetExample>> {
        (0..count).map(|_| self.example()).collect()
    }
}

pub fn write_jsonl<W: Write>(mut writer: W, examples: &[DatasetExample]) -> Result<()> {
    for example in examples {
        serde_json::to_writer(&mut writer, example)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_jsonl_file<P: AsRef<Path>>(path: P, examples: &[DatasetExample]) -> Result<()> {
    let file = File::create(path)?;
    write_jsonl(BufWriter::new(file), examples)
}

/// Reads a JSONL dataset, validating every `output` through the intent classifier.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<DatasetExample>> {
    let mut examples = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)?;
        let instruction = value
            .get("instruction")
            .and_then(Value::as_str)
            .ok_or_else(|| MailError::ValidationError {
                reasons: vec![format!("line {}: missing string field 'instruction'", index + 1)],
            })?
            .to_string();

        let output = value.get("output").unwrap_or(&Value::Null);
        let output = try_classify(output).map_err(|e| match e {
            MailError::ValidationError { reasons } => MailError::ValidationError {
                reasons: reasons
                    .into_iter()
                    .map(|reason| format!("line {}: {}", index + 1, reason))
                    .collect(),
            },
            other => other,
        })?;

        examples.push(DatasetExample {
            instruction,
            output,
        });
    }

    Ok(examples)
}

pub fn read_jsonl_file<P: AsRef<Path>>(path: P) -> Result<Vec<DatasetExample>> {
    read_jsonl(BufReader::new(File::open(path)?))
}
