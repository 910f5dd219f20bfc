use std::io::{BufRead, Seek};
use std::collections::{BTreeSet, VecDeque};

use crate::base::*;
use crate::base::types::*;

use super::{Reader, rebuild};

/// Trailer keys which describe a single cross-reference section rather than the document.
const SECTION_KEYS: [&[u8]; 8] = [b"Prev", b"XRefStm", b"Type", b"W", b"Index", b"Length", b"Filter", b"DecodeParms"];

/// Copies keys from `from` into `into` unless already present there.
pub(super) fn merge_trailer(into: &mut Dict, from: &Dict) {
    for (key, value) in from {
        if !SECTION_KEYS.contains(&key.as_bytes()) && !into.contains_key(key.as_bytes()) {
            into.insert(key.clone(), value.clone());
        }
    }
}

/// Reads the cross-reference chain starting at `startxref`. If that fails in permissive mode, 
/// the table is reconstructed by scanning the file.
pub(super) fn load<T: BufRead + Seek>(reader: &Reader<T>) -> Result<(Option<Offset>, XRef), Error> {
    match read_chain(reader) {
        Ok((entry, xref)) => Ok((Some(entry), xref)),
        Err(err) if reader.options.strict => Err(err),
        Err(err) => {
            log::warn!("Could not read cross-reference chain: {err}");
            Ok((None, rebuild::rebuild(reader)?))
        }
    }
}

fn read_chain<T: BufRead + Seek>(reader: &Reader<T>) -> Result<(Offset, XRef), Error> {
    let parser = &reader.parser;
    let entry = parser.entrypoint()?;
    log::debug!("startxref = {entry}");
    if !parser.points_to_xref(entry)? {
        return Err(Error::MalformedXref("startxref does not point to a cross-reference section"));
    }
    // Sections are visited newest first: a table's /XRefStm before its /Prev.
    let mut queue = VecDeque::from([(entry, false)]);
    let mut visited = BTreeSet::new();
    let mut merged: Option<XRef> = None;
    let mut trailer = Dict::new();
    while let Some((offset, is_aside)) = queue.pop_front() {
        if !visited.insert(offset) {
            log::warn!("Loop in cross-reference chain at {offset}, ignoring.");
            continue;
        }
        let xref = parser.read_xref_at(offset)?;
        if matches!(xref.tpe, XRefType::Table) {
            if let Some(stm_offset) = xref.dict.lookup(b"XRefStm").num_value() {
                if is_aside {
                    log::warn!("/XRefStm pointed to a classical section.");
                } else {
                    queue.push_back((stm_offset, true));
                }
            }
        }
        if let Some(prev) = xref.dict.lookup(b"Prev").num_value() {
            if is_aside {
                log::warn!("Ignoring /Prev in a /XRefStm.");
            } else {
                queue.push_back((prev, false));
            }
        }
        if !is_aside {
            merge_trailer(&mut trailer, &xref.dict);
        }
        merged = Some(match merged {
            None => xref,
            Some(mut newer) => {
                newer.merge_prev(xref);
                newer
            }
        });
    }
    let Some(mut xref) = merged else {
        return Err(Error::MalformedXref("no cross-reference section"));
    };
    if trailer.lookup(b"Root").is_null() {
        return Err(Error::MalformedXref("trailer without /Root"));
    }
    xref.dict = trailer;
    Ok((entry, xref))
}
