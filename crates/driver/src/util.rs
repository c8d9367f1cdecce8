use std::fmt::Write;

/// Writes one character per bit, most significant first, upper case when set.
pub fn fmt_bitflags_u8(
    bits: u8,
    chars: [char; 8],
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    for (bit_i, c) in chars.iter().enumerate() {
        let bit = (bits >> (7 - bit_i)) & 1 != 0;

        f.write_char(if bit { c.to_ascii_uppercase() } else { *c })?;
    }
    Ok(())
}
