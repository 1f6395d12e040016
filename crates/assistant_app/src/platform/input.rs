use assistant_core::Msg;

pub(crate) const SUMMARY_USAGE: &str = "usage: /summary <visit_id> <doctor_id> <patient_id>";

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Prompt(String),
    Summary {
        visit_id: String,
        doctor_id: String,
        patient_id: String,
    },
    Cancel,
    Quit,
    Empty,
    Invalid(String),
}

pub(crate) fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Command::Prompt(line.to_string());
    };

    let mut words = command.split_whitespace();
    match words.next() {
        Some("quit") | Some("exit") => Command::Quit,
        Some("cancel") => Command::Cancel,
        Some("summary") => {
            let args: Vec<&str> = words.collect();
            match args.as_slice() {
                [visit_id, doctor_id, patient_id] => Command::Summary {
                    visit_id: visit_id.to_string(),
                    doctor_id: doctor_id.to_string(),
                    patient_id: patient_id.to_string(),
                },
                _ => Command::Invalid(SUMMARY_USAGE.to_string()),
            }
        }
        _ => Command::Invalid(format!("unknown command: {line}")),
    }
}

impl Command {
    pub(crate) fn into_msgs(self) -> Vec<Msg> {
        match self {
            Command::Prompt(text) => vec![Msg::InputChanged(text), Msg::PromptSubmitted],
            Command::Summary {
                visit_id,
                doctor_id,
                patient_id,
            } => vec![Msg::SummaryRequested {
                visit_id,
                doctor_id,
                patient_id,
            }],
            Command::Cancel | Command::Quit => vec![Msg::CancelClicked],
            Command::Empty | Command::Invalid(_) => Vec::new(),
        }
    }
}
