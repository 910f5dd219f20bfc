use std::io::{BufRead, Seek, Cursor};
use std::collections::BTreeMap;

use regex::bytes::Regex;

use crate::base::*;
use crate::base::types::*;
use crate::parser::ObjParser;
use crate::parser::cc::CharClass;
use crate::utils;

use super::Reader;
use super::chain::merge_trailer;
use super::document::ObjStm;

/// How far past an object header to look for the `/Type` of the object.
const TYPE_WINDOW: usize = 1024;

fn regex(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|_| Error::Parse("invalid search pattern"))
}

/// All `num gen obj` headers in `data`, in file order.
fn scan_headers(data: &[u8]) -> Result<Vec<(ObjNum, ObjGen, usize)>, Error> {
    let re = regex(r"(?-u)(\d+)\s+(\d+)\s+obj\b")?;
    Ok(re.captures_iter(data)
        .filter_map(|cap| {
            let num = utils::parse_num(&cap[1])?;
            let gen = utils::parse_num(&cap[2])?;
            Some((num, gen, cap.get(0)?.start()))
        })
        .collect())
}

// The part of the object starting at `pos` which may contain its dictionary.
fn type_window(data: &[u8], pos: usize) -> &[u8] {
    let window = &data[pos..std::cmp::min(pos + TYPE_WINDOW, data.len())];
    let end = [&b"stream"[..], b"endobj"].iter()
        .filter_map(|kw| utils::find(window, kw))
        .min()
        .unwrap_or(window.len());
    &window[..end]
}

fn window_has_type(window: &[u8], tpe: &[u8]) -> bool {
    let Some(pos) = utils::find(window, b"/Type") else { return false };
    let rest = &window[(pos + 5)..];
    let rest = &rest[rest.iter().position(|c| CharClass::of(*c) != CharClass::Space).unwrap_or(rest.len())..];
    rest.first() == Some(&b'/')
        && rest[1..].starts_with(tpe)
        && rest.get(1 + tpe.len()).map_or(true, |c| !c.is_ascii_alphanumeric())
}

/// Reconstructs the cross-reference table by scanning the whole file for object headers.
pub(super) fn rebuild<T: BufRead + Seek>(reader: &Reader<T>) -> Result<XRef, Error> {
    log::info!("Rebuilding cross-reference table.");
    let data = reader.raw_bytes()?;
    let body = data.get((reader.parser.header().start as usize)..).unwrap_or_default();
    let doc = reader.doc();
    let max_depth = reader.options.max_depth;

    let mut map = BTreeMap::new();
    let mut objstms = Vec::new();
    let mut xref_stms = Vec::new();
    let mut catalogs = Vec::new();
    for (num, gen, pos) in scan_headers(body)? {
        // Later occurrences are newer revisions.
        map.insert(num, Record::Used { gen, offset: pos as Offset });
        let window = type_window(body, pos);
        if window_has_type(window, b"ObjStm") {
            objstms.push((num, pos));
        } else if window_has_type(window, b"XRef") {
            xref_stms.push(pos);
        } else if window_has_type(window, b"Catalog") {
            catalogs.push((num, gen, pos));
        }
    }

    for (num_within, pos) in objstms {
        if map.get(&num_within) != Some(&Record::Used { gen: 0, offset: pos as Offset }) {
            continue;
        }
        let objstm = match reader.parser.read_obj_at(pos as Offset, &())
            .and_then(|(_, obj)| ObjStm::new(&obj, &reader.decode_options()))
        {
            Ok(objstm) => objstm,
            Err(err) => {
                log::warn!("Skipping object stream {num_within}: {err}");
                continue;
            }
        };
        for (index, num) in objstm.numbers().enumerate() {
            // Objects found directly in the file take precedence.
            map.entry(num).or_insert(Record::Compr { num_within, index: index as ObjIndex });
        }
    }

    let mut trailer = Dict::new();
    for m in regex(r"(?-u)trailer\s*<<")?.find_iter(body) {
        let dict_start = m.end() - 2;
        let mut op = ObjParser::with_doc(Cursor::new(&body[dict_start..]), doc, max_depth);
        match op.read_obj() {
            Ok(Object::Dict(dict)) => merge_trailer(&mut trailer, &dict),
            _ => log::warn!("Unreadable trailer at {}", m.start())
        }
    }
    if trailer.is_empty() {
        for pos in xref_stms.into_iter().rev() {
            if let Ok((_, Object::Stream(stm))) = reader.parser.read_obj_at(pos as Offset, &()) {
                merge_trailer(&mut trailer, &stm.dict);
            }
        }
    }
    let has_root = match trailer.lookup(b"Root") {
        Object::Ref(objref) => map.contains_key(&objref.num),
        Object::Null => false,
        _ => true
    };
    if !has_root {
        let catalog = catalogs.into_iter().rev()
            .find(|&(num, gen, pos)| matches!(reader.parser.read_obj_at(pos as Offset, &()),
                Ok((oref, obj)) if oref.num == num && oref.gen == gen && obj.has_type(b"Catalog")));
        let Some((num, gen, _)) = catalog else {
            return Err(Error::MalformedXref("document catalog not found"));
        };
        log::warn!("Using object {num} {gen} as document catalog.");
        trailer.insert("Root", Object::Ref(ObjRef::in_doc(doc, num, gen)));
    }
    let size = map.keys().next_back().map_or(0, |num| num + 1);
    trailer.insert("Size", Object::new_int(size.into()));
    log::info!("Rebuilt cross-reference table with {} entries", map.len());
    Ok(XRef { tpe: XRefType::Rebuilt, map, dict: trailer, size })
}

/// Looks for the last occurrence of a header of object number `num` in `body`.
pub(super) fn find_object(body: &[u8], num: ObjNum) -> Result<Option<(ObjGen, Offset)>, Error> {
    let re = regex(&format!(r"(?-u)(?:^|[^0-9]){num}\s+(\d+)\s+obj\b"))?;
    Ok(re.captures_iter(body)
        .filter_map(|cap| {
            let gen = utils::parse_num(&cap[1])?;
            let m = cap.get(0)?;
            let start = m.start() + m.as_bytes().iter().position(u8::is_ascii_digit)?;
            Some((gen, start as Offset))
        })
        .last())
}
