use std::path::PathBuf;

use crate::{
    elements::{Field, Preset},
    errors::{AppError, Result},
};

pub const HELP: &str = "\
commands:
  set <field> <value>    fill an element (subject, composition, style, lighting,
                         color, mood, details, context); an empty value clears it
  show                   print the current elements
  prompt                 build the basic prompt
  enhance [target use]   refine the prompt with the language model
  image                  generate an image from the latest prompt
  reverse <description>  fill the elements from a free-text description
  save <path>            save the elements as a template
  load <path>            load a template
  example <name>         load a preset (cat, logo, landscape)
  clear                  empty every element
  status                 print the status line
  help                   print this help
  quit                   leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { field: Field, value: String },
    Show,
    Prompt,
    Enhance { target_use: Option<String> },
    Image,
    Reverse { description: String },
    Save { path: PathBuf },
    Load { path: PathBuf },
    Example { preset: Preset },
    Clear,
    Status,
    Help,
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_lowercase().as_str() {
            "set" => {
                let (name, value) = match rest.split_once(char::is_whitespace) {
                    Some((name, value)) => (name, value.trim()),
                    None => (rest, ""),
                };
                let field = Field::from_key(name)
                    .ok_or_else(|| AppError::invalid_input(format!("unknown field '{name}'")))?;
                Command::Set {
                    field,
                    value: value.to_string(),
                }
            }
            "show" => Command::Show,
            "prompt" => Command::Prompt,
            "enhance" => Command::Enhance {
                target_use: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "image" => Command::Image,
            "reverse" => Command::Reverse {
                description: required(rest, "reverse needs a description")?,
            },
            "save" => Command::Save {
                path: required(rest, "save needs a file path")?.into(),
            },
            "load" => Command::Load {
                path: required(rest, "load needs a file path")?.into(),
            },
            "example" => Command::Example {
                preset: Preset::from_name(rest).ok_or_else(|| {
                    AppError::invalid_input(format!("unknown example '{rest}'"))
                })?,
            },
            "clear" => Command::Clear,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(AppError::invalid_input(format!(
                    "unknown command '{other}', type 'help'"
                )));
            }
        };

        Ok(Some(command))
    }
}

fn required(value: &str, message: &str) -> Result<String> {
    if value.is_empty() {
        Err(AppError::invalid_input(message))
    } else {
        Ok(value.to_string())
    }
}
