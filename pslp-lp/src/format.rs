//! `LpModel::read`/`write` round-trip support for the two text formats
//! named in spec §4.9/§6: a CPLEX-style `LP` dialect and a whitespace-
//! tokenised `MPS` dialect. Both are minimal but self-consistent: the
//! driver only needs to read back what it itself writes (spec §6: "The
//! driver emits both; readers should accept both").

use crate::model::LpModel;
use crate::status::{ColumnId, ModelFormat, RowKind, Sense, VariableKind};
use pslp_core::error::{PslpErrorKind, PslpResult, simple};
use std::fmt::Write as _;
use std::path::Path;

impl LpModel {
    /// Write this model to `path` in the given format.
    ///
    /// # Errors
    /// [`PslpErrorKind::Io`] if the file cannot be written.
    pub fn write(&self, path: &Path, format: ModelFormat) -> PslpResult<()> {
        let text = match format {
            ModelFormat::Lp => self.to_lp_string(),
            ModelFormat::Mps => self.to_mps_string(),
        };
        std::fs::write(path, text).map_err(|e| simple_io(&e.to_string()))
    }

    /// Read a model back from `path` in the given format.
    ///
    /// # Errors
    /// [`PslpErrorKind::Io`] if the file cannot be read, or
    /// [`PslpErrorKind::ParseError`] if its contents do not match the
    /// expected dialect.
    pub fn read(path: &Path, format: ModelFormat) -> PslpResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| simple_io(&e.to_string()))?;
        match format {
            ModelFormat::Lp => Self::from_lp_string(&text),
            ModelFormat::Mps => Self::from_mps_string(&text),
        }
    }

    fn to_lp_string(&self) -> String {
        let mut out = String::new();
        let sense_kw = match self.sense() {
            Sense::Max => "Maximize",
            Sense::Min => "Minimize",
        };
        let _ = writeln!(out, "{sense_kw}");
        let _ = write!(out, " obj:");
        for (_, name, _, _, obj, _) in self.columns_for_format() {
            if obj != 0.0 {
                let _ = write!(out, " {obj:+} {name}");
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Subject To");
        for (_, name, coefficients, lower, upper, kind) in self.rows_for_format() {
            let terms = row_terms(self, coefficients);
            match kind {
                RowKind::Le => {
                    let _ = writeln!(out, " {name}:{terms} <= {upper}");
                }
                RowKind::Ge => {
                    let _ = writeln!(out, " {name}:{terms} >= {lower}");
                }
                RowKind::Eq => {
                    let _ = writeln!(out, " {name}:{terms} = {lower}");
                }
                RowKind::Range => {
                    let _ = writeln!(out, " {lower} <= {name}:{terms} <= {upper}");
                }
            }
        }
        let _ = writeln!(out, "Bounds");
        let mut generals = Vec::new();
        let mut binaries = Vec::new();
        for (_, name, lower, upper, _, kind) in self.columns_for_format() {
            match kind {
                VariableKind::Binary => binaries.push(name.to_string()),
                VariableKind::Integer => {
                    let _ = writeln!(out, " {lower} <= {name} <= {upper}");
                    generals.push(name.to_string());
                }
                VariableKind::Continuous => {
                    let _ = writeln!(out, " {lower} <= {name} <= {upper}");
                }
            }
        }
        if !generals.is_empty() {
            let _ = writeln!(out, "Generals");
            for name in &generals {
                let _ = writeln!(out, " {name}");
            }
        }
        if !binaries.is_empty() {
            let _ = writeln!(out, "Binaries");
            for name in &binaries {
                let _ = writeln!(out, " {name}");
            }
        }
        let _ = writeln!(out, "End");
        out
    }

    fn from_lp_string(text: &str) -> PslpResult<Self> {
        let mut model = Self::new();
        let mut names: Vec<String> = Vec::new();
        let mut section = LpSection::None;

        // First pass: column names, so row coefficients can resolve them.
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(next) = lp_section_header(line) {
                section = next;
                continue;
            }
            if section == LpSection::Objective {
                for (_, name) in parse_terms(line)? {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
            if section == LpSection::Constraints {
                let (_, body) = split_row_name(line)?;
                let (terms, _, _) = parse_relation(&body)?;
                for (_, name) in terms {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        for name in &names {
            model.add_column(name.clone(), 0.0, f64::INFINITY, 0.0, VariableKind::Continuous);
        }

        section = LpSection::None;
        let mut row_index = 0usize;
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(next) = lp_section_header(line) {
                section = next;
                match section {
                    LpSection::Maximize => model.set_sense(Sense::Max),
                    LpSection::Minimize => model.set_sense(Sense::Min),
                    _ => {}
                }
                continue;
            }
            match section {
                LpSection::Objective => {
                    for (coeff, name) in parse_terms(line)? {
                        let col = resolve_column(&names, &name)?;
                        model.set_objective(col, coeff)?;
                    }
                }
                LpSection::Constraints => {
                    let (row_name, body) = split_row_name(line)?;
                    let row_name = row_name.unwrap_or_else(|| format!("r{row_index}"));
                    let (terms, kind, bound) = parse_relation(&body)?;
                    let coefficients: PslpResult<Vec<(ColumnId, f64)>> =
                        terms.into_iter().map(|(c, n)| resolve_column(&names, &n).map(|id| (id, c))).collect();
                    let coefficients = coefficients?;
                    let (lower, upper) = match kind {
                        RowKind::Le => (f64::NEG_INFINITY, bound.1),
                        RowKind::Ge => (bound.0, f64::INFINITY),
                        RowKind::Eq => (bound.0, bound.0),
                        RowKind::Range => bound,
                    };
                    model.add_row(row_name, coefficients, lower, upper, kind)?;
                    row_index += 1;
                }
                LpSection::Bounds => {
                    let (lower, name, upper) = parse_bound_line(&line)?;
                    let col = resolve_column(&names, &name)?;
                    model.set_bounds_col(col, lower, upper)?;
                }
                LpSection::Generals => {
                    let col = resolve_column(&names, line)?;
                    model.set_kind(col, VariableKind::Integer)?;
                }
                LpSection::Binaries => {
                    let col = resolve_column(&names, line)?;
                    model.set_kind(col, VariableKind::Binary)?;
                }
                LpSection::None | LpSection::Maximize | LpSection::Minimize => {}
            }
        }
        Ok(model)
    }

    fn to_mps_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "NAME          PSLP");
        let _ = writeln!(out, "ROWS");
        let _ = writeln!(out, " N  COST");
        for (_, name, _, _, _, kind) in self.rows_for_format() {
            let sense = match kind {
                RowKind::Le => 'L',
                RowKind::Ge => 'G',
                RowKind::Eq => 'E',
                RowKind::Range => 'G',
            };
            let _ = writeln!(out, " {sense}  {name}");
        }
        let _ = writeln!(out, "COLUMNS");
        let mut integer_open = false;
        for (col, name, _, _, obj, kind) in self.columns_for_format() {
            let wants_marker = matches!(kind, VariableKind::Integer | VariableKind::Binary);
            if wants_marker && !integer_open {
                let _ = writeln!(out, "    MARKER                 'INTORG'");
                integer_open = true;
            } else if !wants_marker && integer_open {
                let _ = writeln!(out, "    MARKER                 'INTEND'");
                integer_open = false;
            }
            if obj != 0.0 {
                let _ = writeln!(out, "    {name}  COST  {obj}");
            }
            for (row, row_name, coefficients, _, _, _) in self.rows_for_format() {
                let _ = row;
                if let Some(&(_, coeff)) = coefficients.iter().find(|&&(c, _)| c == col) {
                    let _ = writeln!(out, "    {name}  {row_name}  {coeff}");
                }
            }
        }
        if integer_open {
            let _ = writeln!(out, "    MARKER                 'INTEND'");
        }
        let _ = writeln!(out, "RHS");
        for (_, name, _, lower, upper, kind) in self.rows_for_format() {
            let rhs = match kind {
                RowKind::Le => upper,
                RowKind::Ge | RowKind::Eq | RowKind::Range => lower,
            };
            let _ = writeln!(out, "    RHS  {name}  {rhs}");
        }
        let _ = writeln!(out, "RANGES");
        for (_, name, _, lower, upper, kind) in self.rows_for_format() {
            if kind == RowKind::Range {
                let _ = writeln!(out, "    RNG  {name}  {}", upper - lower);
            }
        }
        let _ = writeln!(out, "BOUNDS");
        for (_, name, lower, upper, _, kind) in self.columns_for_format() {
            match kind {
                VariableKind::Binary => {
                    let _ = writeln!(out, " BV BND  {name}");
                }
                _ => {
                    let _ = writeln!(out, " LO BND  {name}  {lower}");
                    let _ = writeln!(out, " UP BND  {name}  {upper}");
                }
            }
        }
        let _ = writeln!(out, "ENDATA");
        out
    }

    fn from_mps_string(text: &str) -> PslpResult<Self> {
        let mut model = Self::new();
        model.set_sense(Sense::Min);
        let mut column_names: Vec<String> = Vec::new();
        let mut row_names: Vec<String> = Vec::new();
        let mut row_kinds: Vec<RowKind> = Vec::new();
        let mut row_entries: Vec<Vec<(String, f64)>> = Vec::new();
        let mut col_obj: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
        let mut col_integer: std::collections::HashMap<String, bool> = std::collections::HashMap::new();
        let mut col_bounds: std::collections::HashMap<String, (f64, f64)> = std::collections::HashMap::new();
        let mut row_rhs: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
        let mut row_range: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
        let mut section = MpsSection::None;
        let mut integer_mode = false;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('*') {
                continue;
            }
            if let Some(next) = mps_section_header(line) {
                section = next;
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            match section {
                MpsSection::Rows => {
                    if fields.len() != 2 {
                        return Err(simple(PslpErrorKind::ParseError, "malformed ROWS entry"));
                    }
                    if fields[0] == "N" {
                        continue;
                    }
                    let kind = match fields[0] {
                        "L" => RowKind::Le,
                        "G" => RowKind::Ge,
                        "E" => RowKind::Eq,
                        _ => return Err(simple(PslpErrorKind::ParseError, "unknown row sense")),
                    };
                    row_names.push(fields[1].to_string());
                    row_kinds.push(kind);
                    row_entries.push(Vec::new());
                }
                MpsSection::Columns => {
                    if fields.first() == Some(&"MARKER") {
                        integer_mode = line.contains("INTORG");
                        continue;
                    }
                    if fields.len() < 3 || fields.len() % 2 != 1 {
                        return Err(simple(PslpErrorKind::ParseError, "malformed COLUMNS entry"));
                    }
                    let name = fields[0].to_string();
                    if !column_names.contains(&name) {
                        column_names.push(name.clone());
                        col_integer.insert(name.clone(), integer_mode);
                    }
                    let mut pairs = fields[1..].chunks_exact(2);
                    for pair in &mut pairs {
                        let row_name = pair[0];
                        let value: f64 = pair[1].parse().map_err(|_| simple(PslpErrorKind::ParseError, "bad COLUMNS coefficient"))?;
                        if row_name == "COST" {
                            col_obj.insert(name.clone(), value);
                        } else if let Some(idx) = row_names.iter().position(|r| r == row_name) {
                            row_entries[idx].push((name.clone(), value));
                        } else {
                            return Err(simple(PslpErrorKind::ParseError, "COLUMNS references unknown row"));
                        }
                    }
                }
                MpsSection::Rhs => {
                    if fields.len() != 3 {
                        return Err(simple(PslpErrorKind::ParseError, "malformed RHS entry"));
                    }
                    let value: f64 = fields[2].parse().map_err(|_| simple(PslpErrorKind::ParseError, "bad RHS value"))?;
                    row_rhs.insert(fields[1].to_string(), value);
                }
                MpsSection::Ranges => {
                    if fields.len() != 3 {
                        return Err(simple(PslpErrorKind::ParseError, "malformed RANGES entry"));
                    }
                    let value: f64 = fields[2].parse().map_err(|_| simple(PslpErrorKind::ParseError, "bad RANGES value"))?;
                    row_range.insert(fields[1].to_string(), value);
                }
                MpsSection::Bounds => {
                    if fields.len() < 3 {
                        return Err(simple(PslpErrorKind::ParseError, "malformed BOUNDS entry"));
                    }
                    let name = fields[2].to_string();
                    if !column_names.contains(&name) {
                        column_names.push(name.clone());
                    }
                    match fields[0] {
                        "BV" => {
                            col_bounds.insert(name.clone(), (0.0, 1.0));
                            col_integer.insert(name, true);
                        }
                        "LO" => {
                            let value: f64 = fields[3].parse().map_err(|_| simple(PslpErrorKind::ParseError, "bad bound value"))?;
                            let entry = col_bounds.entry(name).or_insert((0.0, f64::INFINITY));
                            entry.0 = value;
                        }
                        "UP" => {
                            let value: f64 = fields[3].parse().map_err(|_| simple(PslpErrorKind::ParseError, "bad bound value"))?;
                            let entry = col_bounds.entry(name).or_insert((0.0, f64::INFINITY));
                            entry.1 = value;
                        }
                        _ => return Err(simple(PslpErrorKind::ParseError, "unsupported BOUNDS type")),
                    }
                }
                MpsSection::None | MpsSection::Name | MpsSection::EndData => {}
            }
        }

        let mut id_of: std::collections::HashMap<String, ColumnId> = std::collections::HashMap::new();
        for name in &column_names {
            let (lower, upper) = col_bounds.get(name).copied().unwrap_or((0.0, f64::INFINITY));
            let is_integer = col_integer.get(name).copied().unwrap_or(false);
            let is_binary = is_integer && lower == 0.0 && upper == 1.0;
            let kind = if is_binary {
                VariableKind::Binary
            } else if is_integer {
                VariableKind::Integer
            } else {
                VariableKind::Continuous
            };
            let obj = col_obj.get(name).copied().unwrap_or(0.0);
            let id = model.add_column(name.clone(), lower, upper, obj, kind);
            id_of.insert(name.clone(), id);
        }
        for (i, row_name) in row_names.iter().enumerate() {
            let coefficients: PslpResult<Vec<(ColumnId, f64)>> = row_entries[i]
                .iter()
                .map(|(n, v)| {
                    id_of
                        .get(n)
                        .copied()
                        .map(|id| (id, *v))
                        .ok_or_else(|| simple(PslpErrorKind::ParseError, "row references unknown column"))
                })
                .collect();
            let coefficients = coefficients?;
            let rhs = row_rhs.get(row_name).copied().unwrap_or(0.0);
            let (lower, upper, kind) = match row_range.get(row_name) {
                Some(&range) => (rhs, rhs + range.abs(), RowKind::Range),
                None => match row_kinds[i] {
                    RowKind::Le => (f64::NEG_INFINITY, rhs, RowKind::Le),
                    RowKind::Ge => (rhs, f64::INFINITY, RowKind::Ge),
                    RowKind::Eq => (rhs, rhs, RowKind::Eq),
                    RowKind::Range => (rhs, rhs, RowKind::Range),
                },
            };
            model.add_row(row_name.clone(), coefficients, lower, upper, kind)?;
        }
        Ok(model)
    }
}

fn simple_io(message: &str) -> pslp_core::error::Error {
    context_error::BoxedError::small(PslpErrorKind::Io, "io failure", message.to_string())
}

fn row_terms(model: &LpModel, coefficients: &[(ColumnId, f64)]) -> String {
    let mut s = String::new();
    for &(col, coeff) in coefficients {
        let name = model.column_name(col).unwrap_or("?");
        let _ = write!(s, " {coeff:+} {name}");
    }
    s
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum LpSection {
    None,
    Maximize,
    Minimize,
    Objective,
    Constraints,
    Bounds,
    Generals,
    Binaries,
}

fn lp_section_header(line: &str) -> Option<LpSection> {
    match line {
        "Maximize" | "Max" => Some(LpSection::Maximize),
        "Minimize" | "Min" => Some(LpSection::Minimize),
        "Subject To" | "Subject to" => Some(LpSection::Constraints),
        "Bounds" => Some(LpSection::Bounds),
        "Generals" => Some(LpSection::Generals),
        "Binaries" => Some(LpSection::Binaries),
        "End" => Some(LpSection::None),
        _ => None,
    }
}

fn split_row_name(line: &str) -> PslpResult<(Option<String>, String)> {
    if line.starts_with("obj:") {
        return Ok((None, line["obj:".len()..].to_string()));
    }
    if let Some(idx) = line.find(':') {
        Ok((Some(line[..idx].trim().to_string()), line[idx + 1..].to_string()))
    } else {
        Ok((None, line.to_string()))
    }
}

/// Parse `+2 x0 -3 x1 ...` into `[(2.0, "x0"), (-3.0, "x1"), ...]`.
fn parse_terms(body: &str) -> PslpResult<Vec<(f64, String)>> {
    // Normalise the leading sign onto each token by splitting on whitespace
    // after inserting spaces around +/-.
    let spaced = body.replace('+', " +").replace('-', " -");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    let mut terms = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let mut sign = 1.0;
        let mut tok = tokens[i];
        if tok == "+" {
            i += 1;
            tok = tokens.get(i).copied().unwrap_or("");
        } else if tok == "-" {
            sign = -1.0;
            i += 1;
            tok = tokens.get(i).copied().unwrap_or("");
        }
        let (coeff, name) = if let Ok(value) = tok.parse::<f64>() {
            i += 1;
            let n = tokens.get(i).copied().ok_or_else(|| simple(PslpErrorKind::ParseError, "term missing a variable name"))?;
            i += 1;
            (sign * value, n.to_string())
        } else if tok.starts_with(|c: char| c.is_ascii_digit()) {
            let split_at = tok.find(|c: char| c.is_alphabetic()).unwrap_or(tok.len());
            let value: f64 = tok[..split_at].parse().map_err(|_| simple(PslpErrorKind::ParseError, "malformed coefficient"))?;
            i += 1;
            (sign * value, tok[split_at..].to_string())
        } else {
            i += 1;
            (sign, tok.to_string())
        };
        terms.push((coeff, name));
    }
    Ok(terms)
}

fn parse_relation(body: &str) -> PslpResult<(Vec<(f64, String)>, RowKind, (f64, f64))> {
    for (needle, kind) in [("<=", RowKind::Le), (">=", RowKind::Ge), ("=", RowKind::Eq)] {
        if let Some(idx) = body.find(needle) {
            let lhs = &body[..idx];
            let rhs = &body[idx + needle.len()..];
            let bound: f64 = rhs.trim().parse().map_err(|_| simple(PslpErrorKind::ParseError, "malformed row bound"))?;
            let terms = parse_terms(lhs)?;
            return Ok((terms, kind, (bound, bound)));
        }
    }
    Err(simple(PslpErrorKind::ParseError, "row has no relational operator"))
}

fn parse_bound_line(line: &str) -> PslpResult<(f64, String, f64)> {
    let parts: Vec<&str> = line.split("<=").map(str::trim).collect();
    if parts.len() != 3 {
        return Err(simple(PslpErrorKind::ParseError, "malformed Bounds line"));
    }
    let lower: f64 = parts[0].parse().map_err(|_| simple(PslpErrorKind::ParseError, "malformed lower bound"))?;
    let upper: f64 = parts[2].parse().map_err(|_| simple(PslpErrorKind::ParseError, "malformed upper bound"))?;
    Ok((lower, parts[1].to_string(), upper))
}

fn resolve_column(names: &[String], name: &str) -> PslpResult<ColumnId> {
    names
        .iter()
        .position(|n| n == name)
        .map(ColumnId)
        .ok_or_else(|| simple(PslpErrorKind::ParseError, "reference to an undeclared variable"))
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum MpsSection {
    None,
    Name,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
    EndData,
}

fn mps_section_header(line: &str) -> Option<MpsSection> {
    match line.split_whitespace().next()? {
        "NAME" => Some(MpsSection::Name),
        "ROWS" => Some(MpsSection::Rows),
        "COLUMNS" => Some(MpsSection::Columns),
        "RHS" => Some(MpsSection::Rhs),
        "RANGES" => Some(MpsSection::Ranges),
        "BOUNDS" => Some(MpsSection::Bounds),
        "ENDATA" => Some(MpsSection::EndData),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{RowKind, Sense, VariableKind};
    use std::path::PathBuf;

    fn sample_model() -> LpModel {
        let mut model = LpModel::new();
        let x0 = model.add_column("x0", 0.0, 1.0, 0.5, VariableKind::Binary);
        let x1 = model.add_column("x1", 0.0, 1.0, 0.5, VariableKind::Binary);
        model.set_sense(Sense::Max);
        model.add_row("rt_bin", [(x0, 1.0), (x1, 1.0)], 0.0, 1.0, RowKind::Le).unwrap();
        model
    }

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("pslp-lp-test-{name}-{:?}", std::thread::current().id()));
        path
    }

    #[test]
    fn lp_round_trip_preserves_shape() {
        let model = sample_model();
        let path = temp_path("roundtrip.lp");
        model.write(&path, ModelFormat::Lp).unwrap();
        let read_back = LpModel::read(&path, ModelFormat::Lp).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(read_back.column_count(), model.column_count());
        assert_eq!(read_back.row_count(), model.row_count());
    }

    #[test]
    fn mps_round_trip_preserves_shape() {
        let model = sample_model();
        let path = temp_path("roundtrip.mps");
        model.write(&path, ModelFormat::Mps).unwrap();
        let read_back = LpModel::read(&path, ModelFormat::Mps).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(read_back.column_count(), model.column_count());
        assert_eq!(read_back.row_count(), model.row_count());
    }
}
