// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interactive collection of polynomial roots, one per line.

use std::io::{BufRead, Write};

use log::debug;

use crate::complex::Complex;
use crate::errors::{Error, Result};

const DONE: &str = "done";

/// Prompts on `output` and reads roots from `input` until `done` or
/// end of input.  Blank lines and unparsable lines are skipped; only
/// accepted roots advance the prompt's counter.
pub fn read_roots<R: BufRead, W: Write>(input: R, mut output: W) -> Result<Vec<Complex>> {
    let mut roots = Vec::new();
    let mut lines = input.lines();

    loop {
        write!(output, "Root {}> ", roots.len() + 1)?;
        output.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case(DONE) {
            if roots.is_empty() {
                writeln!(output, "At least one root is required.")?;
                continue;
            }
            break;
        }

        match Complex::parse(line) {
            Ok(root) => {
                debug!("root {}: {}", roots.len() + 1, root);
                roots.push(root);
            }
            Err(_) => writeln!(output, "Cannot parse \"{}\" as a complex number.", line)?,
        }
    }

    if roots.is_empty() {
        return Err(Error::NoRoots);
    }
    writeln!(output)?;
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str) -> (Result<Vec<Complex>>, String) {
        let mut output = Vec::new();
        let roots = read_roots(input.as_bytes(), &mut output);
        (roots, String::from_utf8(output).unwrap())
    }

    #[test]
    fn reads_until_done() {
        let (roots, output) = session("1\n-1 + 0i\ni\n0 - i\ndone\n3\n");
        assert_eq!(
            roots.unwrap(),
            vec![Complex::ONE, Complex::ONE_NEG, Complex::IM, Complex::IM_NEG]
        );
        assert!(output.starts_with("Root 1> Root 2> Root 3> Root 4> Root 5> "));
    }

    #[test]
    fn blank_lines_do_not_count() {
        let (roots, output) = session("\n   \n2\nDONE\n");
        assert_eq!(roots.unwrap(), vec![Complex::new(2.0, 0.0)]);
        assert_eq!(output, "Root 1> Root 1> Root 1> Root 2> \n");
    }

    #[test]
    fn bad_lines_are_reported() {
        let (roots, output) = session("  two \n2\n");
        assert_eq!(roots.unwrap(), vec![Complex::new(2.0, 0.0)]);
        assert!(output.contains("Cannot parse \"two\" as a complex number.\nRoot 1> "));
    }

    #[test]
    fn done_needs_a_root() {
        let (roots, output) = session("done\n1\ndone\n");
        assert_eq!(roots.unwrap(), vec![Complex::ONE]);
        assert!(output.contains("At least one root is required."));
    }

    #[test]
    fn nothing_at_all() {
        match session("").0 {
            Err(Error::NoRoots) => {}
            other => panic!("expected no roots, got {:?}", other),
        }
    }
}
