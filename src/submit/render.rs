// src/submit/render.rs

//! Turning a [`JobSpec`] into the exact argv handed to the queue.
//!
//! Rendering is pure: the same job, dependencies, settings and variables
//! always produce the same [`Invocation`].

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::model::Settings;
use crate::errors::{PipelineError, Result};
use crate::job::{DependencySet, JobSpec};

/// `$NAME` or `${NAME}`.
static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w+|\{[^}]*\})").expect("valid variable pattern"));

/// Where `$VAR` references are resolved from.
#[derive(Debug, Clone, Default)]
pub enum VarSource {
    /// The current process environment.
    #[default]
    Process,
    /// A fixed set of variables; anything else is treated as unset.
    Fixed(HashMap<String, String>),
}

impl VarSource {
    pub fn fixed<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        VarSource::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        match self {
            VarSource::Process => std::env::var(name).ok(),
            VarSource::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

/// Expand `$NAME` and `${NAME}` references. References to unset variables
/// are left as they are.
pub fn expand_vars(input: &str, vars: &VarSource) -> String {
    VAR_PATTERN
        .replace_all(input, |caps: &Captures<'_>| {
            let raw = &caps[1];
            let name = raw
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .unwrap_or(raw);
            vars.get(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Split a command line into words following POSIX shell quoting rules:
/// single quotes are literal, double quotes allow `\` escapes of
/// `\ " $` and backquote, a bare `\` escapes the next character.
pub fn split_words(input: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(unclosed(input, '\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('\\' | '"' | '$' | '`' | '\n')) => current.push(ch),
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err(unclosed(input, '"')),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(unclosed(input, '"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(ch) => current.push(ch),
                    None => {
                        return Err(PipelineError::RenderError(format!(
                            "no escaped character after trailing backslash in: {input}"
                        )));
                    }
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}

fn unclosed(input: &str, quote: char) -> PipelineError {
    PipelineError::RenderError(format!("no closing quotation ({quote}) in: {input}"))
}

/// Quote a word so that [`split_words`] yields it back unchanged.
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r#"'"'"'"#))
    }
}

/// Fully rendered queue submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Program followed by its arguments.
    pub fn tokens(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(|a| a.as_str()))
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.tokens().into_iter().map(quote).collect();
        f.write_str(&rendered.join(" "))
    }
}

/// Render the queue invocation for `job`:
///
/// `<submit_program> -q <queue> [-R <mb>] -N <name> -l <log_dir> -j <hold> <command...>`
pub fn render_invocation(
    settings: &Settings,
    job: &JobSpec,
    depends_on: &DependencySet,
    vars: &VarSource,
) -> Result<Invocation> {
    let mut submit = split_words(&expand_vars(&settings.queue.submit_program, vars))?.into_iter();
    let program = submit.next().ok_or_else(|| {
        PipelineError::RenderError("submit program renders to an empty command".to_string())
    })?;

    let queue = expand_vars(settings.queue_name(job.queue_class), vars);
    let command = split_words(&expand_vars(&job.command, vars))?;
    if command.is_empty() {
        return Err(PipelineError::RenderError(format!(
            "command of job '{}' is empty",
            job.name
        )));
    }

    let mut args: Vec<String> = submit.collect();
    args.push("-q".to_string());
    args.push(queue.trim().to_string());
    if let Some(mb) = job.memory_request_mb {
        args.push("-R".to_string());
        args.push(mb.to_string());
    }
    args.push("-N".to_string());
    args.push(job.name.clone());
    args.push("-l".to_string());
    args.push(job.log_dir().to_string_lossy().into_owned());
    args.push("-j".to_string());
    args.push(depends_on.hold_arg());
    args.extend(command);

    Ok(Invocation { program, args })
}
