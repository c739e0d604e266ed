use crate::decoder::{Decoded, Decoder};
use crate::instructions::{InstrDesc, INVALID, TABLE};

/// LoongArch32 Reduced decoder.
/// Scans the template table in declaration order and takes the first match;
/// the trailing catch-all makes decoding total.
pub struct La32rDecoder {
    table: &'static [InstrDesc],
}

impl La32rDecoder {
    pub fn new() -> Self {
        Self { table: TABLE }
    }

    /// Template selected for `raw32`.
    pub fn lookup(&self, raw32: u32) -> &'static InstrDesc {
        self.table
            .iter()
            .find(|d| d.pattern.matches(raw32))
            .unwrap_or(&INVALID)
    }
}

impl Default for La32rDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for La32rDecoder {
    fn decode(&self, raw32: u32) -> Decoded {
        let desc = self.lookup(raw32);
        Decoded::new(desc.op, desc.format, raw32)
    }
}
