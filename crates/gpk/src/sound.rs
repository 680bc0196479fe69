//! Sound objects

use binrw::binrw;

/// Payload of a `SoundNodeWave` object: the embedded audio bulk data
#[binrw]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[brw(little)]
pub struct SoundNodeWave {
    #[br(temp)]
    #[bw(calc = data.len() as u32)]
    data_size: u32,

    #[br(count = data_size)]
    pub data: Vec<u8>,
}

impl SoundNodeWave {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}
