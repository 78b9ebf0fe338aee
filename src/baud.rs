//! Baud rate detection for modems with an unknown UART configuration.

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;

use crate::client::{AtClient, Transport};
use crate::error::Error;
use crate::matcher::Patterns;

/// Candidate rates, most common first.
pub const BAUD_RATES: [u32; 13] = [
    115_200, 57_600, 38_400, 19_200, 9_600, 74_400, 74_880, 230_400, 460_800, 2_400, 4_800,
    14_400, 28_800,
];

const ATTEMPTS_PER_RATE: usize = 3;
const SETTLE_TIME: Duration = Duration::from_millis(10);

/// Transport whose line rate can be changed at runtime.
pub trait SetBaudRate {
    type Error;

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error>;
}

/// Try every rate in [`BAUD_RATES`] within `min..=max` until the modem answers
/// a bare `AT` with `OK`, leaving the transport at that rate.
pub fn auto_baud<T, D>(client: &mut AtClient<T, D>, min: u32, max: u32) -> Result<u32, Error>
where
    T: Transport + SetBaudRate,
    D: DelayNs,
{
    let timeout = client.config().response_timeout;

    for rate in BAUD_RATES.iter().copied().filter(|r| (min..=max).contains(r)) {
        debug!("Trying baud rate {}...", rate);
        client
            .transport_mut()
            .set_baud_rate(rate)
            .map_err(|_| Error::BaudDetection)?;
        client.pause(SETTLE_TIME);

        for _ in 0..ATTEMPTS_PER_RATE {
            client.send_at(&[])?;
            if client.wait_for(timeout, &Patterns::new(b"OK"))?.is(1) {
                info!("Modem responded at rate {}", rate);
                return Ok(rate);
            }
        }
    }

    Err(Error::BaudDetection)
}
