//! USDA (ASCII) file parser.
//!
//! This module provides line-by-line parsing of USDA text files.
//! The parser is intentionally simple and handles the patterns scene exporters
//! write for placement data; mesh geometry is skipped.
//!
//! # Supported Syntax
//!
//! - Layer metadata: `defaultPrim = "Name"`, `upAxis = "Z"`
//! - `def Xform "Name" { ... }`, `def Scope "Name" { ... }`
//! - `def Mesh "Name" { ... }`
//! - `references = @./file.usda@</Prim>` (inline or in a metadata block)
//! - `xformOp:translate`, `xformOp:scale`, `xformOp:orient`
//! - `xformOp:rotateX/Y/Z`, `xformOp:rotateXYZ` (and the other five orders)
//! - `xformOp:transform` (4x4 matrix, row-major as authored)

use std::collections::VecDeque;

use levelgen_math::{EulerOrder, Mat4, Quat, Vec3};
use thiserror::Error;

use super::types::*;

/// Errors that can occur during USDA parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unexpected end of file")]
    UnexpectedEof,

    #[error("Invalid number format: {0}")]
    InvalidNumber(String),

    #[error("Unclosed block starting at line {0}")]
    UnclosedBlock(usize),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Reference target found in prim metadata: (asset path, optional prim path).
type ReferenceInfo = (String, Option<String>);

/// USDA file parser.
pub struct UsdaParser {
    lines: VecDeque<(usize, String)>,
    current_line: usize,
}

impl UsdaParser {
    /// Create a new parser from file contents.
    pub fn new(content: &str) -> Self {
        let lines: VecDeque<_> = content
            .lines()
            .enumerate()
            .map(|(i, s)| (i + 1, s.to_string()))
            .collect();

        Self {
            lines,
            current_line: 0,
        }
    }

    /// Parse the USDA content and return the layer.
    pub fn parse(&mut self) -> ParseResult<UsdLayer> {
        let mut layer = UsdLayer::default();

        // Header: comments, blank lines and the layer metadata block in parentheses
        let mut in_header_metadata = false;
        while let Some((_, line)) = self.lines.front() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                self.lines.pop_front();
            } else if trimmed.starts_with('(') && !in_header_metadata {
                in_header_metadata = !trimmed.ends_with(')');
                Self::read_layer_metadata(trimmed, &mut layer);
                self.lines.pop_front();
            } else if in_header_metadata {
                if trimmed.ends_with(')') || trimmed == ")" {
                    in_header_metadata = false;
                }
                Self::read_layer_metadata(trimmed, &mut layer);
                self.lines.pop_front();
            } else {
                break;
            }
        }

        // Parse root prims
        while !self.lines.is_empty() {
            if let Some(prim) = self.parse_prim("")? {
                layer.prims.push(prim);
            } else if let Some((num, line)) = self.lines.front() {
                // A stray closing brace at root level would otherwise loop forever
                if line.trim() == "}" {
                    return Err(ParseError::Parse {
                        line: *num,
                        message: "Unmatched '}'".to_string(),
                    });
                }
            }
        }

        Ok(layer)
    }

    /// Pick `defaultPrim` and `upAxis` out of a header metadata line.
    fn read_layer_metadata(line: &str, layer: &mut UsdLayer) {
        if line.contains("defaultPrim") {
            layer.default_prim = quoted(line).map(str::to_string);
        } else if line.contains("upAxis") {
            layer.up_axis = quoted(line).map(str::to_string);
        }
    }

    /// Parse a single prim and its children.
    fn parse_prim(&mut self, parent_path: &str) -> ParseResult<Option<UsdPrim>> {
        // Get next non-empty line
        let (line_num, line) = loop {
            match self.lines.pop_front() {
                Some((num, line)) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        self.current_line = num;
                        break (num, line);
                    }
                }
                None => return Ok(None),
            }
        };

        let trimmed = line.trim();

        // Check for closing brace
        if trimmed == "}" {
            // Put it back for the caller to handle
            self.lines.push_front((line_num, line));
            return Ok(None);
        }

        // Abstract class prims are never placed
        if trimmed.starts_with("class ") {
            self.skip_prim_block(line_num, trimmed)?;
            return Ok(None);
        }

        // Parse prim definition: def Type "Name" { or def Type "Name" (
        if trimmed.starts_with("def ") || trimmed.starts_with("over ") {
            let trimmed = trimmed.to_string();
            return self.parse_def(&trimmed, parent_path, line_num);
        }

        // Skip other lines (attributes will be parsed within prim blocks)
        Ok(None)
    }

    /// Parse a `def Type "Name"` block.
    fn parse_def(&mut self, line: &str, parent_path: &str, start_line: usize) -> ParseResult<Option<UsdPrim>> {
        // Extract type and name: def Type "Name" {
        let rest = line
            .strip_prefix("def ")
            .or_else(|| line.strip_prefix("over "))
            .unwrap_or(line);

        // Type is the first word unless the name follows directly (`over "Name"`)
        let prim_type = match rest.split_whitespace().next() {
            Some(word) if !word.starts_with('"') => word,
            _ => "",
        };

        let name = quoted(rest).unwrap_or("");

        let path = if parent_path.is_empty() {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent_path, name)
        };

        // Metadata can be: inline (refs = @path@), multi-line starting on def line, or on next line.
        // Only the part before any inline body is metadata.
        let head = line.split('{').next().unwrap_or(line);
        let (reference_info, brace_consumed) = if let Some(paren_start) = head.find('(') {
            if let Some(paren_end) = head.rfind(')') {
                let metadata = &head[paren_start..=paren_end];
                if metadata.contains("references") && metadata.contains('@') {
                    (Some(self.parse_reference_line(metadata)?), false)
                } else {
                    (None, false)
                }
            } else {
                self.parse_metadata_block()?
            }
        } else if self.next_line_opens_metadata() {
            match self.lines.pop_front() {
                // `( references = @a.usda@ )` on a single line
                Some((num, open)) if open.matches('(').count() == open.matches(')').count() => {
                    self.current_line = num;
                    let brace = opens_body(&open);
                    if open.contains("references") && open.contains('@') {
                        (Some(self.parse_reference_line(&open)?), brace)
                    } else {
                        (None, brace)
                    }
                }
                Some(_) => self.parse_metadata_block()?,
                None => (None, false),
            }
        } else {
            (None, false)
        };

        let has_inline_brace = line.contains('{');
        let has_inline_close = line.trim_end().ends_with('}');

        // Entire prim on one line: def Type "Name" (refs) { content }
        if has_inline_brace && has_inline_close {
            let brace_start = line.find('{').unwrap_or(0);
            let brace_end = line.rfind('}').unwrap_or(line.len());
            let inline_content = line[brace_start + 1..brace_end].trim();
            let xform_ops = self.parse_inline_xform_ops(inline_content)?;

            if let Some((asset_path, target_prim)) = reference_info {
                return Ok(Some(UsdPrim::Reference(UsdReference {
                    path,
                    name: name.to_string(),
                    asset_path,
                    target_prim_path: target_prim,
                    xform_ops,
                    children: Vec::new(),
                })));
            }

            return Ok(Some(match prim_type {
                "Mesh" => UsdPrim::Mesh(UsdMesh {
                    path,
                    name: name.to_string(),
                    xform_ops,
                }),
                _ => UsdPrim::Xform(UsdXform {
                    path,
                    name: name.to_string(),
                    xform_ops,
                    children: Vec::new(),
                }),
            }));
        }

        // Not inline - expect opening brace
        if !has_inline_brace && !brace_consumed {
            self.expect_opening_brace(start_line)?;
        }

        let (xform_ops, children) = self.parse_block_content(&path, start_line)?;

        if let Some((asset_path, target_prim)) = reference_info {
            return Ok(Some(UsdPrim::Reference(UsdReference {
                path,
                name: name.to_string(),
                asset_path,
                target_prim_path: target_prim,
                xform_ops,
                children,
            })));
        }

        let prim = match prim_type {
            "Xform" | "Scope" | "" => UsdPrim::Xform(UsdXform {
                path,
                name: name.to_string(),
                xform_ops,
                children,
            }),
            "Mesh" => UsdPrim::Mesh(UsdMesh {
                path,
                name: name.to_string(),
                xform_ops,
            }),
            other => {
                log::debug!("Skipping unsupported prim type {} at line {}", other, start_line);
                UsdPrim::Unknown(other.to_string())
            }
        };

        Ok(Some(prim))
    }

    /// Whether the next non-blank line starts a `( ... )` metadata block.
    fn next_line_opens_metadata(&mut self) -> bool {
        while let Some((_, line)) = self.lines.front() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.lines.pop_front();
                continue;
            }
            return trimmed.starts_with('(');
        }
        false
    }

    /// Consume a metadata block whose opening paren was already consumed.
    ///
    /// Returns the reference target if one is present, and whether the
    /// closing line also opened the prim body (`) {`).
    fn parse_metadata_block(&mut self) -> ParseResult<(Option<ReferenceInfo>, bool)> {
        let mut metadata_lines = Vec::new();
        let mut depth = 1i32;

        while depth > 0 {
            match self.lines.pop_front() {
                Some((num, line)) => {
                    self.current_line = num;
                    depth += line.matches('(').count() as i32;
                    depth -= line.matches(')').count() as i32;
                    metadata_lines.push(line);
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }

        let brace_consumed = metadata_lines.last().is_some_and(|line| opens_body(line));

        // Look for references = @path@</prim> pattern
        for line in &metadata_lines {
            if line.contains("references") && line.contains('@') {
                return Ok((Some(self.parse_reference_line(line)?), brace_consumed));
            }
        }

        Ok((None, brace_consumed))
    }

    /// Parse a reference line like: references = @./tree.usda@</Tree>
    fn parse_reference_line(&self, line: &str) -> ParseResult<ReferenceInfo> {
        let first_at = line.find('@');
        let second_at = first_at.and_then(|start| line[start + 1..].find('@').map(|i| start + 1 + i));

        if let (Some(start), Some(end)) = (first_at, second_at) {
            let asset_path = line[start + 1..end].to_string();

            // Look for target prim path after the closing @
            let after_ref = &line[end + 1..];
            let target_prim = match (after_ref.find('<'), after_ref.find('>')) {
                (Some(prim_start), Some(prim_end)) if prim_start < prim_end => {
                    Some(after_ref[prim_start + 1..prim_end].to_string())
                }
                _ => None,
            };

            return Ok((asset_path, target_prim));
        }

        Err(ParseError::Parse {
            line: self.current_line,
            message: format!("Invalid reference syntax: {}", line.trim()),
        })
    }

    /// Parse xformOps from inline content (semicolon separated attributes).
    fn parse_inline_xform_ops(&self, content: &str) -> ParseResult<Vec<XformOp>> {
        let mut ops = Vec::new();

        for part in content.split(';') {
            if let Some(op) = self.parse_xform_op(part.trim())? {
                ops.push(op);
            }
        }

        Ok(ops)
    }

    /// Expect and consume an opening brace.
    fn expect_opening_brace(&mut self, start_line: usize) -> ParseResult<()> {
        while let Some((_num, line)) = self.lines.front() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.lines.pop_front();
                continue;
            }
            if trimmed == "{" {
                self.lines.pop_front();
                return Ok(());
            }
            return Err(ParseError::Parse {
                line: start_line,
                message: "Expected opening brace".to_string(),
            });
        }

        Err(ParseError::UnclosedBlock(start_line))
    }

    /// Skip a block (consume until matching closing brace).
    fn skip_block(&mut self, start_line: usize) -> ParseResult<()> {
        let mut depth = 1i32;

        while depth > 0 {
            match self.lines.pop_front() {
                Some((_, line)) => {
                    depth += line.matches('{').count() as i32;
                    depth -= line.matches('}').count() as i32;
                }
                None => return Err(ParseError::UnclosedBlock(start_line)),
            }
        }

        Ok(())
    }

    /// Parse the body of any prim: transform ops and child prims.
    ///
    /// Other attributes (geometry, primvars, dictionaries) are skipped.
    fn parse_block_content(&mut self, path: &str, start_line: usize) -> ParseResult<(Vec<XformOp>, Vec<UsdPrim>)> {
        let mut xform_ops = Vec::new();
        let mut children = Vec::new();

        loop {
            let (line_num, line) = match self.lines.pop_front() {
                Some(x) => x,
                None => return Err(ParseError::UnclosedBlock(start_line)),
            };
            self.current_line = line_num;

            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if trimmed == "}" {
                break;
            }

            // Check for child prim FIRST (before xformOps, since def lines may contain xformOp text)
            if trimmed.starts_with("def ") || trimmed.starts_with("over ") {
                self.lines.push_front((line_num, line));
                if let Some(child) = self.parse_prim(path)? {
                    children.push(child);
                }
                continue;
            }

            if let Some(op) = self.parse_xform_op(trimmed)? {
                xform_ops.push(op);
                continue;
            }

            // Nested braces (dictionaries, variant sets) are not interpreted
            if trimmed.ends_with('{') {
                self.skip_block(line_num)?;
                continue;
            }

            // Multi-line attribute values (point arrays, metadata) may carry parens
            let opens = trimmed.matches('(').count() + trimmed.matches('[').count();
            let closes = trimmed.matches(')').count() + trimmed.matches(']').count();
            if opens > closes {
                self.skip_until_balanced(opens - closes, start_line)?;
            }
        }

        Ok((xform_ops, children))
    }

    /// Skip a whole prim starting at `first_line`, metadata included.
    fn skip_prim_block(&mut self, start_line: usize, first_line: &str) -> ParseResult<()> {
        let mut line = first_line.to_string();
        while !line.contains('{') {
            match self.lines.pop_front() {
                Some((_, next)) => line = next,
                None => return Err(ParseError::UnclosedBlock(start_line)),
            }
        }

        if line.matches('{').count() > line.matches('}').count() {
            self.skip_block(start_line)?;
        }
        Ok(())
    }

    /// Consume lines until `depth` open brackets/parens are closed.
    fn skip_until_balanced(&mut self, depth: usize, start_line: usize) -> ParseResult<()> {
        let mut depth = depth as i64;
        while depth > 0 {
            match self.lines.pop_front() {
                Some((_, line)) => {
                    depth += (line.matches('(').count() + line.matches('[').count()) as i64;
                    depth -= (line.matches(')').count() + line.matches(']').count()) as i64;
                }
                None => return Err(ParseError::UnclosedBlock(start_line)),
            }
        }
        Ok(())
    }

    /// Parse a single xformOp attribute.
    fn parse_xform_op(&self, line: &str) -> ParseResult<Option<XformOp>> {
        // Skip xformOpOrder - it just lists the order of ops, not actual values
        if line.contains("xformOpOrder") || !line.contains('=') {
            return Ok(None);
        }

        let Some(op_start) = line.find("xformOp:") else {
            return Ok(None);
        };
        // Op name runs to the first whitespace or '=' (e.g. `xformOp:rotateXYZ`)
        let op_name: String = line[op_start + "xformOp:".len()..]
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '=')
            .collect();
        // Suffixed ops like `xformOp:translate:pivot` share the base kind
        let base = op_name.split(':').next().unwrap_or("");

        let op = match base {
            "translate" => XformOp::Translate(self.parse_inline_vec3(line)?),
            "scale" => XformOp::Scale(self.parse_inline_vec3(line)?),
            "rotateX" => XformOp::RotateX(self.parse_inline_float(line)?),
            "rotateY" => XformOp::RotateY(self.parse_inline_float(line)?),
            "rotateZ" => XformOp::RotateZ(self.parse_inline_float(line)?),
            "orient" => {
                // Quaternion literals are (real, i, j, k)
                let [w, x, y, z] = self.parse_inline_numbers::<4>(line)?;
                XformOp::Orient(Quat::from_xyzw(x, y, z, w))
            }
            "transform" => {
                // Authored rows are basis vectors with translation last, i.e. glam columns
                let values = self.parse_inline_numbers::<16>(line)?;
                XformOp::Transform(Mat4::from_cols_slice(&values))
            }
            rotate if rotate.len() == 9 && rotate.starts_with("rotate") => {
                let order = rotate["rotate".len()..].parse::<EulerOrder>().map_err(|e| ParseError::Parse {
                    line: self.current_line,
                    message: e.to_string(),
                })?;
                XformOp::Rotate {
                    order,
                    degrees: self.parse_inline_vec3(line)?,
                }
            }
            other => {
                log::warn!("Ignoring unsupported xformOp:{} at line {}", other, self.current_line);
                return Ok(None);
            }
        };

        Ok(Some(op))
    }

    /// Parse an inline Vec3 value like (1, 2, 3) after the `=`.
    fn parse_inline_vec3(&self, line: &str) -> ParseResult<Vec3> {
        let [x, y, z] = self.parse_inline_numbers::<3>(line)?;
        Ok(Vec3::new(x, y, z))
    }

    /// Parse exactly `N` numbers from the value after the `=`, ignoring parens and commas.
    fn parse_inline_numbers<const N: usize>(&self, line: &str) -> ParseResult<[f32; N]> {
        let eq_pos = line.find('=').ok_or_else(|| ParseError::Parse {
            line: self.current_line,
            message: "Expected '='".to_string(),
        })?;

        let value = &line[eq_pos + 1..];
        if !value.contains('(') {
            return Err(ParseError::Parse {
                line: self.current_line,
                message: format!("Expected '(' in: {}", line.trim()),
            });
        }

        let numbers = value
            .split(|c: char| c == '(' || c == ')' || c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f32>().map_err(|_| ParseError::InvalidNumber(s.to_string())))
            .collect::<ParseResult<Vec<f32>>>()?;

        numbers.try_into().map_err(|v: Vec<f32>| ParseError::Parse {
            line: self.current_line,
            message: format!("Expected {} components, got {}", N, v.len()),
        })
    }

    /// Parse an inline float value.
    fn parse_inline_float(&self, line: &str) -> ParseResult<f32> {
        let eq_pos = line.find('=').ok_or_else(|| ParseError::Parse {
            line: self.current_line,
            message: "Expected '='".to_string(),
        })?;

        let value_str = line[eq_pos + 1..].trim();
        value_str
            .parse::<f32>()
            .map_err(|_| ParseError::InvalidNumber(value_str.to_string()))
    }
}

/// Whether a metadata closing line also opens the prim body, as in `) {`.
fn opens_body(line: &str) -> bool {
    line.rfind(')').is_some_and(|end| line[end..].contains('{'))
}

/// Contents of the first double-quoted string on a line.
fn quoted(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let len = line[start..].find('"')?;
    Some(&line[start..start + len])
}

/// Parse a USDA string and return the layer.
pub fn parse_usda(content: &str) -> ParseResult<UsdLayer> {
    let mut parser = UsdaParser::new(content);
    parser.parse()
}
