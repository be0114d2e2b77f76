use crate::constants::{fields, schema, stage};
use crate::data::{RawRecord, RecordType, Stage};

/// Infer the production stage of a record.
///
/// An explicit stage field wins; otherwise the form title and discriminator
/// text are scanned for stage keywords. Process records that reference only an
/// assembly or only a cartoning work order fall back to that stage.
pub fn infer_stage(raw: &RawRecord, record_type: RecordType) -> Stage {
    if let Some(explicit) = raw.first_text(fields::STAGE) {
        let stage = stage_from_text(&explicit);
        if stage != Stage::Unknown {
            return stage;
        }
    }

    let mut hints = raw.all_text(fields::FORM_TITLE);
    hints.extend(raw.all_text(schema::DISCRIMINATOR_FIELDS));
    let from_hints = stage_from_text(&hints.join(" "));
    if from_hints != Stage::Unknown || record_type != RecordType::Process {
        return from_hints;
    }

    let assembly = raw.has_any(&["assemblyWo", "assembly_wo"]);
    let cartoning = raw.has_any(&["cartoningWo", "cartoning_wo"]);
    match (assembly, cartoning) {
        (true, false) => Stage::Wip,
        (false, true) => Stage::Fg,
        _ => Stage::Unknown,
    }
}

/// Keyword match; text that names both stages (or neither) is `Unknown`.
pub fn stage_from_text(text: &str) -> Stage {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    let wip = matches_any(&lowered, &tokens, stage::WIP_KEYWORDS);
    let fg = matches_any(&lowered, &tokens, stage::FG_KEYWORDS);
    match (wip, fg) {
        (true, false) => Stage::Wip,
        (false, true) => Stage::Fg,
        _ => Stage::Unknown,
    }
}

fn matches_any(lowered: &str, tokens: &[&str], keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        if keyword.contains(' ') || keyword.contains('-') {
            lowered.contains(keyword)
        } else {
            tokens.iter().any(|token| token.starts_with(keyword))
        }
    })
}
