//! Engine name lookup in the hardware root-of-trust properties file.

use super::{LineReader, RawLine};
use crate::constants::ENGINE_KEY;
use crate::limits::{truncate_on_char_boundary, ENGINE_MAX};
use crate::prelude::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Returns the engine named by the first `hrotengine=` line of `path`.
///
/// A missing or unreadable file, a missing key and an empty value all yield
/// `None`. Overlong and non-UTF-8 lines are skipped. The value is truncated to
/// [`ENGINE_MAX`] bytes.
pub(crate) fn read_engine(path: &Path) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!("no engine properties at {}: {}", path.display(), e);
            return None;
        }
    };
    find_engine(BufReader::new(file), path)
}

fn find_engine<R: BufRead>(input: R, path: &Path) -> Option<String> {
    let mut reader = LineReader::new(input);
    loop {
        let (number, line) = match reader.next_line() {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(e) => {
                warn!("failed to read {}: {}", path.display(), e);
                break;
            }
        };
        match line {
            RawLine::Text(text) => {
                if let Some(value) = text.strip_prefix(ENGINE_KEY) {
                    let engine = truncate_on_char_boundary(value, ENGINE_MAX);
                    if engine.is_empty() {
                        return None;
                    }
                    debug!("engine {:?} from {}", engine, path.display());
                    return Some(engine.to_owned());
                }
            }
            RawLine::TooLong | RawLine::InvalidUtf8 => {
                warn!("skipping unreadable line {} of {}", number, path.display());
            }
        }
    }
    debug!("no {} entry in {}", ENGINE_KEY, path.display());
    None
}
