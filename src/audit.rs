//! Non-fatal structural checks of a loaded document

use std::fmt;

use crate::document::Document;
use crate::factory::{Dictionary, Group};
use crate::types::Handle;

/// Kind of an audit finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditKind {
    /// A pointer tag names a handle that does not exist
    DanglingPointer,
    /// A table the revision requires is missing
    MissingTable,
    UndefinedLayer,
    UndefinedLinetype,
    UndefinedTextStyle,
    /// An INSERT or DIMENSION references a block that is not defined
    UndefinedBlock,
    /// The owner tag of a block member does not name its block
    OwnerMismatch,
    /// A GROUP lists a handle that is not a live entity
    InvalidGroupMember,
    MissingHandle,
}

/// One problem found by [`audit`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuditFinding {
    pub kind: AuditKind,
    /// Offending group; null for document level findings
    pub handle: Handle,
    pub message: String,
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.handle.is_null() {
            write!(f, "{:?}: {}", self.kind, self.message)
        } else {
            write!(f, "{:?} at #{:X}: {}", self.kind, self.handle, self.message)
        }
    }
}

/// Findings of an audit run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditReport {
    findings: Vec<AuditFinding>,
}

impl AuditReport {
    fn add(&mut self, kind: AuditKind, handle: Handle, message: impl Into<String>) {
        self.findings.push(AuditFinding {
            kind,
            handle,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AuditFinding> {
        self.findings.iter()
    }

    pub fn has(&self, kind: AuditKind) -> bool {
        self.findings.iter().any(|f| f.kind == kind)
    }

    pub fn of_kind(&self, kind: AuditKind) -> Vec<&AuditFinding> {
        self.findings.iter().filter(|f| f.kind == kind).collect()
    }
}

impl<'a> IntoIterator for &'a AuditReport {
    type Item = &'a AuditFinding;
    type IntoIter = std::slice::Iter<'a, AuditFinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}

fn is_by_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("BYLAYER") || name.eq_ignore_ascii_case("BYBLOCK")
}

/// Check the document without changing it.
pub fn audit(doc: &Document) -> AuditReport {
    let mut report = AuditReport::default();
    check_tables(doc, &mut report);
    check_handles(doc, &mut report);
    check_members(doc, &mut report);
    if !doc.is_legacy() {
        check_groups(doc, &mut report);
    }
    report
}

fn check_tables(doc: &Document, report: &mut AuditReport) {
    for table in doc.required_tables() {
        if !doc.tables.contains(table) {
            report.add(AuditKind::MissingTable, Handle::NULL, format!("table {} is missing", table));
        }
    }
}

fn check_handles(doc: &Document, report: &mut AuditReport) {
    for (key, group) in doc.db.iter() {
        if group.handle().is_none() {
            report.add(AuditKind::MissingHandle, key, format!("{} without handle", group.dxftype()));
        }
        for (_, pointer) in group.pointers() {
            if pointer.is_valid() && !doc.db.contains(pointer) {
                report.add(
                    AuditKind::DanglingPointer,
                    key,
                    format!("{} points to missing #{:X}", group.dxftype(), pointer),
                );
            }
        }
    }
}

fn check_members(doc: &Document, report: &mut AuditReport) {
    let extended = !doc.is_legacy();
    for block in doc.blocks.iter() {
        let key = block.key();
        for handle in &block.entities {
            let Ok(group) = doc.db.get(*handle) else { continue };
            let dxftype = group.dxftype();
            if let Some(layer) = group.get_str(8) {
                if !doc.tables.has_record("LAYER", layer) {
                    report.add(AuditKind::UndefinedLayer, *handle, format!("{} on undefined layer '{}'", dxftype, layer));
                }
            }
            if let Some(linetype) = group.get_str(6) {
                if !is_by_name(linetype) && !doc.tables.has_record("LTYPE", linetype) {
                    report.add(
                        AuditKind::UndefinedLinetype,
                        *handle,
                        format!("{} uses undefined linetype '{}'", dxftype, linetype),
                    );
                }
            }
            if matches!(dxftype, "TEXT" | "MTEXT" | "ATTDEF") {
                if let Some(style) = group.get_str(7) {
                    if !doc.tables.has_record("STYLE", style) {
                        report.add(
                            AuditKind::UndefinedTextStyle,
                            *handle,
                            format!("{} uses undefined text style '{}'", dxftype, style),
                        );
                    }
                }
            }
            match (dxftype, group.get_str(2).unwrap_or_default()) {
                ("DIMENSION", "") => {}
                ("INSERT" | "DIMENSION", name) if !doc.blocks.contains_name(name) => {
                    report.add(
                        AuditKind::UndefinedBlock,
                        *handle,
                        format!("{} of undefined block '{}'", dxftype, name),
                    );
                }
                _ => {}
            }
            if extended && group.owner() != Some(key) {
                report.add(
                    AuditKind::OwnerMismatch,
                    *handle,
                    format!("owner tag does not name block '{}'", block.name),
                );
            }
        }
    }
}

fn check_groups(doc: &Document, report: &mut AuditReport) {
    let Some(dict) = doc.rootdict_entry("ACAD_GROUP") else { return };
    let schema = doc.factory.schema();
    let Ok(dict) = doc.db.get(dict) else { return };
    for (name, handle) in Dictionary::new(dict, schema).entries() {
        let Ok(group) = doc.db.get(handle) else { continue };
        for member in Group::new(group, schema).handles() {
            if !doc.db.contains(member) || doc.blocks.owner_of(member).is_none() {
                report.add(
                    AuditKind::InvalidGroupMember,
                    handle,
                    format!("group '{}' lists #{:X}, which is not an entity", name, member),
                );
            }
        }
    }
}
