use no_std_net::Ipv4Addr;

/// Parse the dotted quad a modem reports as its local address.
///
/// Parsing is lenient: stray characters inside the first three octets are
/// ignored, any non-digit in the last octet ends the address, and octets
/// wrap modulo 256. More than three dots yields `0.0.0.0`.
pub fn ip_from_str(s: &str) -> Ipv4Addr {
    let mut parts = [0u8; 4];
    let mut part = 0;

    for c in s.bytes() {
        match c {
            b'.' => {
                part += 1;
                if part > 3 {
                    return Ipv4Addr::UNSPECIFIED;
                }
            }
            b'0'..=b'9' => {
                parts[part] = parts[part].wrapping_mul(10).wrapping_add(c - b'0');
            }
            _ if part == 3 => break,
            _ => {}
        }
    }

    Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3])
}
