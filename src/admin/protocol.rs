//! Wire format of the admin channel.

pub const UPDATE_SERVICE: &str = "updateService";
pub const LINE_ENDING: &str = "\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    UpdateService(String),
}

impl AdminCommand {
    /// Parses one command. Trailing line endings are ignored, otherwise the
    /// input must be exactly `updateService <name>` separated by one space.
    pub fn parse(input: &str) -> Option<Self> {
        let line = input.trim_end_matches(['\r', '\n']);
        let parts: Vec<&str> = line.split(' ').collect();

        match parts.as_slice() {
            [UPDATE_SERVICE, name] if !name.is_empty() => {
                Some(AdminCommand::UpdateService(name.to_string()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminReply {
    Updating,
    ServiceNotFound,
    UnrecognizedCommand,
}

impl AdminReply {
    pub fn message(&self) -> &'static str {
        match self {
            AdminReply::Updating => "updating service",
            AdminReply::ServiceNotFound => "service not found",
            AdminReply::UnrecognizedCommand => "unrecognized command",
        }
    }

    pub fn to_wire(&self) -> String {
        format!("{}{}", self.message(), LINE_ENDING)
    }
}
