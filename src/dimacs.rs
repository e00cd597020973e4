//! DIMACS CNF loading.
//!
//! Parses the plain-text format used to exchange SAT instances: comment
//! lines beginning with `c`, a single `p cnf <vars> <clauses>` header, and
//! one or more clauses of whitespace-separated literals terminated by `0`.
//! Literals use the usual `l` / `-l` one-based convention, translated here
//! straight into [`Literal::positive`]/[`Literal::negative`] so the loader
//! and [`crate::search::cdcl_search`] share one literal representation
//! end to end.

use crate::core::error::{SolverError, SolverResult};
use crate::nogood::{ClauseBase, Literal};
use crate::variables::{VarId, VarStore};

/// A loaded CNF instance: the boolean variables it declares and the
/// clause base ready to hand to [`crate::search::cdcl_search`].
#[derive(Debug)]
pub struct CnfInstance {
    /// One boolean variable per DIMACS variable index (1-based in the
    /// text, `vars[0]` corresponds to DIMACS variable `1`).
    pub vars: Vec<VarId>,
    /// Every parsed clause.
    pub clauses: ClauseBase,
}

/// Parse a DIMACS CNF document, declaring one boolean variable per
/// DIMACS variable index and one clause per line in `vars`/`clauses`.
///
/// # Errors
///
/// Returns [`SolverError::DimacsParse`] on a malformed header, an
/// out-of-range or zero literal outside a clause terminator, or a clause
/// missing its trailing `0`.
pub fn parse(text: &str, store: &mut VarStore) -> SolverResult<CnfInstance> {
    let mut header: Option<(usize, usize)> = None;
    let mut vars: Vec<VarId> = Vec::new();
    let mut clause_base = ClauseBase::new();
    let mut pending: Vec<Literal> = Vec::new();
    let mut clauses_seen = 0usize;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("p cnf") {
            let mut parts = rest.split_whitespace();
            let nvars = parse_usize(&mut parts, line_no, "variable count")?;
            let nclauses = parse_usize(&mut parts, line_no, "clause count")?;
            header = Some((nvars, nclauses));
            vars = (0..nvars).map(|_| store.new_boolean()).collect();
            continue;
        }
        let Some((nvars, _)) = header else {
            return Err(SolverError::DimacsParse { line: line_no, message: "clause before 'p cnf' header".into() });
        };
        for token in line.split_whitespace() {
            let code: i64 = token.parse().map_err(|_| SolverError::DimacsParse {
                line: line_no,
                message: format!("'{token}' is not an integer literal"),
            })?;
            if code == 0 {
                clause_base.add(std::mem::take(&mut pending));
                clauses_seen += 1;
                continue;
            }
            let var_index = code.unsigned_abs() as usize;
            if var_index == 0 || var_index > nvars {
                return Err(SolverError::DimacsParse {
                    line: line_no,
                    message: format!("literal {code} refers to undeclared variable {var_index}"),
                });
            }
            let var = vars[var_index - 1];
            pending.push(if code > 0 { Literal::positive(var) } else { Literal::negative(var) });
        }
    }

    if !pending.is_empty() {
        return Err(SolverError::DimacsParse { line: text.lines().count(), message: "clause missing trailing 0".into() });
    }
    if header.is_none() {
        return Err(SolverError::DimacsParse { line: 0, message: "missing 'p cnf' header".into() });
    }
    let (_, declared_clauses) = header.unwrap();
    if clauses_seen != declared_clauses {
        return Err(SolverError::DimacsParse {
            line: text.lines().count(),
            message: format!("header declared {declared_clauses} clauses, found {clauses_seen}"),
        });
    }

    Ok(CnfInstance { vars, clauses: clause_base })
}

fn parse_usize(parts: &mut std::str::SplitWhitespace<'_>, line: usize, what: &str) -> SolverResult<usize> {
    parts
        .next()
        .ok_or_else(|| SolverError::DimacsParse { line, message: format!("missing {what} in header") })?
        .parse()
        .map_err(|_| SolverError::DimacsParse { line, message: format!("malformed {what} in header") })
}
