use lzma_alone::{CompressOptions, Header, Level};
use proptest::{prelude::any, prop_assert_eq, proptest};

mod utils;

fn options() -> CompressOptions {
    CompressOptions::default()
        .level(Level::Fastest)
        .dict_size(1 << 16)
}

proptest! {
    #[test]
    fn header_round_trip(
        pb in 0..=4u8,
        lp in 0..=4u8,
        lc in 0..=8u8,
        dict_size in 0..=lzma_alone::MAX_DICT_SIZE,
        size in proptest::option::of(0..u64::MAX),
    ) {
        let header = Header {
            pb,
            lp,
            lc,
            is_streamed: size.is_none(),
            uncompressed_size: size.unwrap_or(0),
            dict_size,
        };
        prop_assert_eq!(Header::decode(&header.encode()).unwrap(), header);
    }

    #[test]
    fn header_decode_never_panics(raw in any::<[u8; 13]>()) {
        if let Ok(header) = Header::decode(&raw) {
            prop_assert_eq!(header.encode(), raw);
        }
    }

    #[test]
    fn chunked_compress(ref input in any::<utils::InputStream>()) {
        let compressed = utils::compress_with(options(), &mut input.source());
        let whole = utils::compress_with(options(), &mut &input.bytes()[..]);
        prop_assert_eq!(&compressed, &whole);
        prop_assert_eq!(utils::decompress(&compressed).unwrap(), input.bytes());
    }

    #[test]
    fn chunked_decompress(
        ref input in any::<Vec<u8>>(),
        chunk_size in 1..20usize,
    ) {
        let compressed = utils::compress_with(options(), &mut &input[..]);
        let mut source = utils::Chunks::fixed(&compressed, chunk_size);
        let output = utils::decompress_from(&mut source).unwrap();
        prop_assert_eq!(&output, input);
    }
}
