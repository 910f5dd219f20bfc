use crate::base::{Dict, Error};

struct Params {
    predictor: u8,
    colors: usize,
    bpc: usize,
    columns: usize,
}

impl Params {
    fn from_dict(dict: &Dict) -> Result<Self, Error> {
        let params = Params {
            predictor: dict.lookup(b"Predictor").num_value().unwrap_or(1),
            colors: dict.lookup(b"Colors").num_value().unwrap_or(1),
            bpc: dict.lookup(b"BitsPerComponent").num_value().unwrap_or(8),
            columns: dict.lookup(b"Columns").num_value().unwrap_or(1),
        };
        if params.predictor == 1 {
            return Ok(params);
        }
        if !matches!(params.bpc, 1 | 2 | 4 | 8 | 16) {
            return Err(Error::Decode("invalid /BitsPerComponent"));
        }
        if !(1..=32).contains(&params.colors) || params.columns == 0 || params.columns > 1 << 24 {
            return Err(Error::Decode("invalid predictor parameters"));
        }
        Ok(params)
    }

    fn samples_per_row(&self) -> usize {
        self.colors * self.columns
    }

    fn row_len(&self) -> usize {
        (self.samples_per_row() * self.bpc + 7) / 8
    }

    /// Bytes per complete pixel, rounded up to at least 1.
    fn bpp(&self) -> usize {
        std::cmp::max(1, self.colors * self.bpc / 8)
    }
}

/// Reverses the effect of `/Predictor` on decompressed data.
pub(super) fn decode(data: Vec<u8>, params: &Dict) -> Result<Vec<u8>, Error> {
    let params = Params::from_dict(params)?;
    match params.predictor {
        1 => Ok(data),
        2 => Ok(tiff_decode(data, &params)),
        10..=15 => png_decode(&data, &params),
        _ => Err(Error::Decode("unknown predictor"))
    }
}

/// Applies `/Predictor` to data before compression. PNG predictors 10 to 14 select the 
/// corresponding filter type for all rows, 15 uses Paeth.
pub(super) fn encode(data: Vec<u8>, params: &Dict) -> Result<Vec<u8>, Error> {
    let params = Params::from_dict(params)?;
    match params.predictor {
        1 => Ok(data),
        2 => Ok(tiff_encode(data, &params)),
        10..=14 => Ok(png_encode(&data, &params, params.predictor - 10)),
        15 => Ok(png_encode(&data, &params, 4)),
        _ => Err(Error::Decode("unknown predictor"))
    }
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

// The value predicted for row[i] by PNG filter `tpe`, given the reconstructed preceding bytes.
fn png_prediction(tpe: u8, row: &[u8], prev: &[u8], i: usize, bpp: usize) -> u8 {
    let left = if i >= bpp { row[i - bpp] } else { 0 };
    let up = prev[i];
    let upleft = if i >= bpp { prev[i - bpp] } else { 0 };
    match tpe {
        1 => left,
        2 => up,
        3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
        4 => paeth(left, up, upleft),
        _ => 0
    }
}

fn png_decode(data: &[u8], params: &Params) -> Result<Vec<u8>, Error> {
    let row_len = params.row_len();
    let bpp = params.bpp();
    let mut out = Vec::with_capacity(data.len() / (row_len + 1) * row_len + row_len);
    let mut prev = vec![0u8; row_len];
    for chunk in data.chunks(row_len + 1) {
        let (tpe, enc) = (chunk[0], &chunk[1..]);
        if tpe > 4 {
            return Err(Error::Decode("unknown PNG filter type"));
        }
        let mut row = enc.to_vec();
        for i in 0..row.len() {
            row[i] = row[i].wrapping_add(png_prediction(tpe, &row, &prev, i, bpp));
        }
        prev[..row.len()].copy_from_slice(&row);
        out.extend_from_slice(&row);
    }
    Ok(out)
}

fn png_encode(data: &[u8], params: &Params, tpe: u8) -> Vec<u8> {
    let row_len = params.row_len();
    let bpp = params.bpp();
    let mut out = Vec::with_capacity(data.len() + data.len() / row_len + 1);
    let mut prev: &[u8] = &vec![0u8; row_len];
    for row in data.chunks(row_len) {
        out.push(tpe);
        for i in 0..row.len() {
            out.push(row[i].wrapping_sub(png_prediction(tpe, row, prev, i, bpp)));
        }
        prev = row;
    }
    out
}

fn get_sample(row: &[u8], ix: usize, bpc: usize) -> u16 {
    match bpc {
        16 => u16::from_be_bytes([row[2 * ix], row[2 * ix + 1]]),
        8 => u16::from(row[ix]),
        _ => {
            let bit = ix * bpc;
            let shift = 8 - bpc - bit % 8;
            u16::from((row[bit / 8] >> shift) & ((1 << bpc) - 1))
        }
    }
}

fn set_sample(row: &mut [u8], ix: usize, bpc: usize, val: u16) {
    match bpc {
        16 => row[(2 * ix)..(2 * ix + 2)].copy_from_slice(&val.to_be_bytes()),
        8 => row[ix] = val as u8,
        _ => {
            let bit = ix * bpc;
            let shift = 8 - bpc - bit % 8;
            let mask = (((1u16 << bpc) - 1) as u8) << shift;
            row[bit / 8] = (row[bit / 8] & !mask) | (((val as u8) << shift) & mask);
        }
    }
}

// Number of complete samples in a (possibly truncated) row.
fn samples_in(row: &[u8], params: &Params) -> usize {
    std::cmp::min(params.samples_per_row(), row.len() * 8 / params.bpc)
}

fn tiff_decode(mut data: Vec<u8>, params: &Params) -> Vec<u8> {
    let (bpc, colors) = (params.bpc, params.colors);
    let mask = ((1u32 << bpc) - 1) as u16;
    for row in data.chunks_mut(params.row_len()) {
        for ix in colors..samples_in(row, params) {
            let val = get_sample(row, ix, bpc).wrapping_add(get_sample(row, ix - colors, bpc)) & mask;
            set_sample(row, ix, bpc, val);
        }
    }
    data
}

fn tiff_encode(mut data: Vec<u8>, params: &Params) -> Vec<u8> {
    let (bpc, colors) = (params.bpc, params.colors);
    let mask = ((1u32 << bpc) - 1) as u16;
    for row in data.chunks_mut(params.row_len()) {
        for ix in (colors..samples_in(row, params)).rev() {
            let val = get_sample(row, ix, bpc).wrapping_sub(get_sample(row, ix - colors, bpc)) & mask;
            set_sample(row, ix, bpc, val);
        }
    }
    data
}
