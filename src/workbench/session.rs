use std::io::Write;

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
};
use tracing::{debug, info};

use super::{Command, HELP, WorkerEvent, Workbench};
use crate::{elements::Field, errors::Result};

/// Drives a workbench from line input, applying worker results as they
/// arrive. `quit` leaves at once; at end of input the session waits for the
/// background calls still running and reports them before returning.
pub async fn run_session<R, W>(
    mut workbench: Workbench,
    mut events: mpsc::UnboundedReceiver<WorkerEvent>,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(output, "{HELP}")?;
    info!(target: "workbench", "interactive session started");

    let mut input_open = true;
    loop {
        if !input_open && workbench.in_flight() == 0 {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        if !handle_line(&mut workbench, &line, &mut output).await? {
                            break;
                        }
                    }
                    None => {
                        debug!(
                            target: "workbench",
                            pending = workbench.in_flight(),
                            "input closed, waiting for background calls"
                        );
                        input_open = false;
                    }
                }
            }
            Some(event) = events.recv() => {
                report_event(&mut workbench, event, &mut output)?;
            }
            else => break,
        }
        output.flush()?;
    }

    info!(target: "workbench", "interactive session finished");
    Ok(())
}

// Returns false once the operator asks to leave.
async fn handle_line<W: Write>(
    workbench: &mut Workbench,
    line: &str,
    output: &mut W,
) -> Result<bool> {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(true),
        Err(err) => {
            writeln!(output, "error: {err}")?;
            return Ok(true);
        }
    };

    let outcome = match command {
        Command::Quit => return Ok(false),
        Command::Help => {
            writeln!(output, "{HELP}")?;
            Ok(())
        }
        Command::Status => {
            writeln!(output, "[{}]", workbench.status())?;
            Ok(())
        }
        Command::Show => {
            write_form(workbench, output)?;
            Ok(())
        }
        Command::Set { field, value } => {
            workbench.set_field(field, value);
            Ok(())
        }
        Command::Prompt => match workbench.generate_prompt() {
            Ok(prompt) => {
                writeln!(output, "{prompt}")?;
                Ok(())
            }
            Err(err) => Err(err),
        },
        Command::Enhance { target_use } => workbench.enhance(target_use.as_deref()),
        Command::Image => workbench.request_image(),
        Command::Reverse { description } => {
            workbench.reverse(&description);
            Ok(())
        }
        Command::Save { path } => workbench.save_template(&path).await,
        Command::Load { path } => workbench.load_template(&path).await,
        Command::Example { preset } => {
            workbench.load_example(preset);
            Ok(())
        }
        Command::Clear => {
            workbench.clear();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        writeln!(output, "error: {err}")?;
    }
    writeln!(output, "[{}]", workbench.status())?;
    Ok(true)
}

fn report_event<W: Write>(
    workbench: &mut Workbench,
    event: WorkerEvent,
    output: &mut W,
) -> Result<()> {
    let reversed = matches!(event, WorkerEvent::Reversed { .. });
    let enhanced = matches!(event, WorkerEvent::Enhanced { .. });
    let image_url = match &event {
        WorkerEvent::ImageFinished { url } => url.clone(),
        _ => None,
    };
    workbench.apply(event);

    if enhanced {
        if let Some(prompt) = workbench.enhanced_prompt() {
            writeln!(output, "{prompt}")?;
        }
    } else if reversed {
        write_form(workbench, output)?;
    } else if let Some(url) = image_url {
        writeln!(output, "{url}")?;
    }

    writeln!(output, "[{}]", workbench.status())?;
    Ok(())
}

fn write_form<W: Write>(workbench: &Workbench, output: &mut W) -> Result<()> {
    for field in Field::ALL {
        writeln!(output, "{:>12}: {}", field.key(), workbench.form().get(field))?;
    }

    let extras = [
        ("prompt", workbench.basic_prompt()),
        ("enhanced", workbench.enhanced_prompt()),
        ("image", workbench.last_image_url()),
    ];
    for (label, value) in extras {
        if let Some(value) = value {
            writeln!(output, "{label:>12}: {value}")?;
        }
    }
    Ok(())
}
