//! CRC-32 (ISO-HDLC) accumulator built on a precomputed lookup table

use crate::hashing::traits::{DigestAlgorithm, StreamingHasher};

/// Reflected form of the IEEE 802.3 polynomial
const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup table, computed once at compile time
static CRC32_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC32_POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

pub struct Crc32Algorithm;

pub(crate) static CRC32: Crc32Algorithm = Crc32Algorithm;

/// CRC-32 streaming hasher
struct Crc32StreamingHasher {
    crc: u32,
}

impl Crc32StreamingHasher {
    fn new() -> Self {
        Self { crc: 0xFFFF_FFFF }
    }
}

impl StreamingHasher for Crc32StreamingHasher {
    fn update(&mut self, data: &[u8]) {
        let mut crc = self.crc;
        for &byte in data {
            crc = CRC32_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
        }
        self.crc = crc;
    }

    fn finalize(self: Box<Self>) -> String {
        format!("{:08x}", !self.crc)
    }
}

impl DigestAlgorithm for Crc32Algorithm {
    fn id(&self) -> &'static str {
        "crc32"
    }

    fn display_name(&self) -> &'static str {
        "CRC-32"
    }

    fn create_hasher(&self) -> Box<dyn StreamingHasher> {
        Box::new(Crc32StreamingHasher::new())
    }
}
