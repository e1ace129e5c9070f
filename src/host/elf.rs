//! Minimal ELF reader for the program interpreter (`PT_INTERP`)
//!
//! Only enough of the format to find the dynamic loader path of a binary,
//! which names the C runtime it was linked against.

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";
const CLASS_32: u8 = 1;
const CLASS_64: u8 = 2;
const DATA_LE: u8 = 1;
const DATA_BE: u8 = 2;
const PT_INTERP: u32 = 3;

#[derive(Clone, Copy)]
struct Reader<'a> {
    bytes: &'a [u8],
    little_endian: bool,
}

impl Reader<'_> {
    fn slice<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        self.bytes.get(offset..end)?.try_into().ok()
    }

    fn u16(&self, offset: usize) -> Option<u16> {
        let raw = self.slice::<2>(offset)?;
        Some(if self.little_endian {
            u16::from_le_bytes(raw)
        } else {
            u16::from_be_bytes(raw)
        })
    }

    fn u32(&self, offset: usize) -> Option<u32> {
        let raw = self.slice::<4>(offset)?;
        Some(if self.little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    }

    fn u64(&self, offset: usize) -> Option<u64> {
        let raw = self.slice::<8>(offset)?;
        Some(if self.little_endian {
            u64::from_le_bytes(raw)
        } else {
            u64::from_be_bytes(raw)
        })
    }
}

/// Program interpreter path of an ELF image, if it has one
///
/// Returns `None` for non-ELF data, truncated headers, and statically linked
/// binaries.
pub(crate) fn program_interpreter(bytes: &[u8]) -> Option<String> {
    if bytes.get(..4)? != ELF_MAGIC {
        return None;
    }
    let class = *bytes.get(4)?;
    let little_endian = match *bytes.get(5)? {
        DATA_LE => true,
        DATA_BE => false,
        _ => return None,
    };
    let r = Reader {
        bytes,
        little_endian,
    };

    let (phoff, phentsize, phnum) = match class {
        CLASS_64 => (r.u64(0x20)?, r.u16(0x36)?, r.u16(0x38)?),
        CLASS_32 => (u64::from(r.u32(0x1c)?), r.u16(0x2a)?, r.u16(0x2c)?),
        _ => return None,
    };

    let phoff = usize::try_from(phoff).ok()?;
    for index in 0..usize::from(phnum) {
        let header = phoff.checked_add(index.checked_mul(usize::from(phentsize))?)?;
        if r.u32(header)? != PT_INTERP {
            continue;
        }
        let (offset, size) = match class {
            CLASS_64 => (r.u64(header + 8)?, r.u64(header + 32)?),
            _ => (u64::from(r.u32(header + 4)?), u64::from(r.u32(header + 16)?)),
        };
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(size).ok()?)?;
        let raw = bytes.get(start..end)?;
        let raw = raw.split(|b| *b == 0).next().unwrap_or(raw);
        return std::str::from_utf8(raw).ok().map(str::to_string);
    }
    None
}
