use super::error::PlcpError;
use super::layout;

pub struct PlcpReader<'a> {
    plcp: &'a [u8],
}

impl<'a> PlcpReader<'a> {
    pub fn new(plcp: &'a [u8]) -> Self {
        Self { plcp }
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, PlcpError> {
        self.plcp.get(offset).copied().ok_or(PlcpError::TooShort {
            needed: offset + 1,
            actual: self.plcp.len(),
        })
    }

    pub fn read_ofdm_rate_code(&self, offset: usize) -> Result<u8, PlcpError> {
        Ok(self.read_u8(offset)? & layout::OFDM_RATE_MASK)
    }

    /// MCS index, 40 MHz flag and short-GI flag from the HT-SIG starting at `offset`.
    pub fn read_ht_sig(&self, offset: usize) -> Result<(u8, bool, bool), PlcpError> {
        let sig1 = self.read_u8(offset)?;
        let sig2 = self.read_u8(offset + layout::HT_SIG2_DISTANCE)?;
        Ok((
            sig1 & layout::HT_MCS_MASK,
            sig1 & layout::HT_CBW40_BIT != 0,
            sig2 & layout::HT_SHORT_GI_BIT != 0,
        ))
    }
}
