use crate::base::*;
use crate::base::types::*;
use crate::codecs::{self, DecodeOptions, Filter};

use super::Writer;

/// Options for [`Writer::clone_object()`].
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// If the cloned value is itself a reference, copy its target into a new object even if it
    /// has been cloned before. References found further down still reuse earlier copies.
    pub force_duplicate: bool,
    /// Keys to leave out of every dictionary copied, e.g. `Parent` when moving a page.
    pub ignore_fields: Vec<Name>,
    /// Decode streams and compress them anew with `FlateDecode`. Streams using a filter which
    /// can not be decoded losslessly are copied as they are.
    pub reencode: bool,
    /// Ceiling on the decoded size of a stream being reencoded. If `None`, the source decides.
    pub max_decoded_size: Option<usize>,
}

impl CloneOptions {
    pub fn with_force_duplicate(self, force_duplicate: bool) -> Self {
        CloneOptions { force_duplicate, ..self }
    }

    pub fn with_ignore_fields(self, ignore_fields: Vec<Name>) -> Self {
        CloneOptions { ignore_fields, ..self }
    }

    pub fn with_reencode(self, reencode: bool) -> Self {
        CloneOptions { reencode, ..self }
    }

    pub fn with_max_decoded_size(self, max_decoded_size: Option<usize>) -> Self {
        CloneOptions { max_decoded_size, ..self }
    }
}

/// Objects reserved in the destination, waiting for their contents to be copied.
type Pending = Vec<(ObjNum, Object)>;

impl Writer {
    /// Deep-copies `value` from the document behind `source` into this writer.
    ///
    /// Every indirect object reachable from `value` is copied once into a new object of this
    /// writer and references to it are translated. Translations are remembered per source
    /// document, so cloning the same source object again, even in a later call, gives the same
    /// reference. Returns the copy of `value` itself, which is left to the caller to place.
    ///
    /// On error, the objects reserved by this call are dropped again.
    pub fn clone_object<R: Resolver + ?Sized>(&mut self, value: &Object, source: &R, options: &CloneOptions)
        -> Result<Object, Error>
    {
        let mark = self.objects.len();
        let result = self.clone_graph(value, source, options);
        if result.is_err() {
            self.rollback(mark);
        }
        result
    }

    fn clone_graph<R: Resolver + ?Sized>(&mut self, value: &Object, source: &R, options: &CloneOptions)
        -> Result<Object, Error>
    {
        let mut pending = Pending::new();
        let top = match value {
            Object::Ref(objref) if options.force_duplicate => {
                let target = source.resolve_ref(objref)?;
                let num = self.reserve();
                self.translations.entry(objref.doc).or_default()
                    .entry((objref.num, objref.gen))
                    .or_insert(num);
                pending.push((num, target));
                Object::Ref(self.local_ref(num))
            },
            value => self.translate(value.clone(), source, options, &mut pending)?
        };
        let mut count = 0;
        while let Some((num, obj)) = pending.pop() {
            let copy = self.translate(obj, source, options, &mut pending)?;
            self.objects[(num - 1) as usize] = Some(copy);
            count += 1;
        }
        log::debug!("Cloned {count} indirect objects");
        Ok(top)
    }

    fn reserve(&mut self) -> ObjNum {
        self.add_object(Object::Null).num
    }

    /// Forgets the objects reserved after the table had `mark` entries.
    fn rollback(&mut self, mark: usize) {
        log::debug!("Dropping {} reserved objects", self.objects.len().saturating_sub(mark));
        self.objects.truncate(mark);
        self.gens.truncate(mark);
        for map in self.translations.values_mut() {
            map.retain(|_, num| *num as usize <= mark);
        }
    }

    /// Copies the direct part of `obj`. Referenced objects not seen before get a reserved number
    /// and are queued in `pending`.
    fn translate<R: Resolver + ?Sized>(&mut self, obj: Object, source: &R, options: &CloneOptions,
        pending: &mut Pending) -> Result<Object, Error>
    {
        Ok(match obj {
            Object::Ref(objref) => {
                let known = self.translations.get(&objref.doc)
                    .and_then(|map| map.get(&(objref.num, objref.gen)))
                    .copied();
                let num = match known {
                    Some(num) => num,
                    None => {
                        let target = source.resolve_ref(&objref)?;
                        let num = self.reserve();
                        self.translations.entry(objref.doc).or_default()
                            .insert((objref.num, objref.gen), num);
                        pending.push((num, target));
                        num
                    }
                };
                Object::Ref(self.local_ref(num))
            },
            Object::Array(arr) => {
                let mut out = Vec::with_capacity(arr.len());
                for item in arr {
                    out.push(self.translate(item, source, options, pending)?);
                }
                Object::Array(out)
            },
            Object::Dict(dict) => Object::Dict(self.translate_dict(dict, source, options, pending)?),
            Object::Stream(stm) => {
                let stm = if options.reencode { reencode(stm, source, options.max_decoded_size)? } else { stm };
                let (dict, data) = stm.into_parts();
                Object::Stream(Stream::new(self.translate_dict(dict, source, options, pending)?, data))
            },
            obj => obj
        })
    }

    fn translate_dict<R: Resolver + ?Sized>(&mut self, dict: Dict, source: &R, options: &CloneOptions,
        pending: &mut Pending) -> Result<Dict, Error>
    {
        let mut out = Dict::new();
        for (key, value) in dict {
            if options.ignore_fields.contains(&key) {
                continue;
            }
            out.insert(key, self.translate(value, source, options, pending)?);
        }
        Ok(out)
    }
}

/// Replaces the filters of a stream by `FlateDecode`, if all of them can be undone.
fn reencode<R: Resolver + ?Sized>(stm: Stream, source: &R, max_output: Option<usize>) -> Result<Stream, Error> {
    let decode_options = match max_output {
        Some(max_output) => DecodeOptions::default().with_max_output(max_output),
        None => DecodeOptions::default()
    };
    let filters = codecs::parse_filters(&stm.dict, source, &decode_options)?;
    if !filters.iter().all(Filter::is_lossless_decodable) {
        return Ok(stm);
    }
    let data = match max_output {
        _ if filters.is_empty() => stm.data().to_vec(),
        Some(_) => codecs::decode(stm.data(), &filters, &decode_options)?,
        None => source.decode_stream(&stm)?
    };
    let (mut dict, _) = stm.into_parts();
    dict.remove(b"DecodeParms");
    dict.insert("Filter", Object::new_name(b"FlateDecode"));
    let mut stm = Stream::new(dict, Vec::new());
    stm.set_data(codecs::encode(&data, &[Filter::Flate(Dict::new())])?);
    Ok(stm)
}
