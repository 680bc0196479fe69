use gpk_compression::{
    compress, decompress, decompress_into, decompress_with, BlockLayout, BlockWriterOptions,
    CompressionMethod, FormatError, Result,
};
use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;

const METHODS: [CompressionMethod; 3] = [
    CompressionMethod::None,
    CompressionMethod::Zlib,
    CompressionMethod::Lzo,
];

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31) ^ (i >> 3)) as u8).collect()
}

#[traced_test]
#[test]
fn every_method_round_trips() -> Result<()> {
    for method in METHODS {
        for len in [0, 1, 4095, 4096, 4097, 3 * 4096 + 17] {
            let data = sample(len);
            let chunk = compress(
                &data,
                BlockWriterOptions::builder()
                    .method(method)
                    .block_size(4096)
                    .build(),
            )?;

            for parallel in [false, true] {
                info!("{method:?} len={len} parallel={parallel}");
                assert_eq!(decompress_with(&chunk, len, method, parallel)?, data);
            }
        }
    }

    Ok(())
}

#[traced_test]
#[test]
fn parallel_and_sequential_agree() -> Result<()> {
    let data = sample(1 << 20);
    let chunk = compress(&data, BlockWriterOptions::builder().block_size(0x8000).build())?;

    let sequential = decompress(&chunk, data.len(), false)?;
    let parallel = decompress(&chunk, data.len(), true)?;
    assert_eq!(sequential, parallel);
    assert_eq!(parallel, data);

    Ok(())
}

#[test]
fn blocks_tile_the_destination() -> Result<()> {
    let data = sample(10 * 1000 + 1);
    let chunk = compress(&data, BlockWriterOptions::builder().block_size(1000).build())?;
    let layout = BlockLayout::parse(&chunk)?;

    assert_eq!(layout.len(), 11);
    let mut expected_destination = 0;
    let mut expected_source = layout.header().header_size()?;
    for descriptor in layout.descriptors() {
        assert_eq!(descriptor.destination_offset, expected_destination);
        assert_eq!(descriptor.source_offset, expected_source);
        expected_destination += descriptor.destination_size;
        expected_source += descriptor.source_size;
    }
    assert_eq!(expected_destination, data.len());
    assert_eq!(expected_source, chunk.len());
    assert_eq!(layout.encoded_size(), chunk.len());

    Ok(())
}

#[test]
fn decompress_into_reports_consumed_bytes() -> Result<()> {
    let data = sample(5000);
    let mut chunk = compress(&data, BlockWriterOptions::builder().block_size(2048).build())?;
    let encoded = chunk.len();
    // Anything after the chunk is left alone
    chunk.extend_from_slice(&[0xAA; 32]);

    let mut destination = vec![0u8; 6000];
    let (written, consumed) =
        decompress_into(&chunk, &mut destination, CompressionMethod::Zlib, true)?;

    assert_eq!(written, data.len());
    assert_eq!(consumed, encoded);
    assert_eq!(&destination[..written], &data[..]);
    assert!(destination[written..].iter().all(|b| *b == 0));

    Ok(())
}

#[traced_test]
#[test]
fn corrupted_zlib_block_is_rejected() -> Result<()> {
    let data = sample(8192);
    let chunk = compress(
        &data,
        BlockWriterOptions::builder()
            .method(CompressionMethod::Zlib)
            .block_size(4096)
            .build(),
    )?;
    let layout = BlockLayout::parse(&chunk)?;
    let second = layout.descriptors()[1];

    for position in [
        second.source_offset,
        second.source_offset + 1,
        second.source_offset + second.source_size / 2,
        second.source_offset + second.source_size - 1,
    ] {
        let mut corrupted = chunk.clone();
        corrupted[position] ^= 0xFF;

        for parallel in [false, true] {
            info!("flipped byte {position} parallel={parallel}");
            let result = decompress_with(&corrupted, data.len(), CompressionMethod::Zlib, parallel);
            assert!(
                matches!(result, Err(FormatError::CorruptBlock { index: 1, .. })),
                "{result:?}"
            );
        }
    }

    Ok(())
}

#[traced_test]
#[test]
fn every_flipped_byte_of_a_default_chunk_is_rejected() -> Result<()> {
    let data = sample(8192);
    let chunk = compress(&data, BlockWriterOptions::builder().block_size(4096).build())?;
    let layout = BlockLayout::parse(&chunk)?;
    let second = layout.descriptors()[1];

    for position in second.source_range() {
        let mut corrupted = chunk.clone();
        corrupted[position] ^= 0xFF;

        let result = decompress(&corrupted, data.len(), false);
        assert!(
            matches!(result, Err(FormatError::CorruptBlock { index: 1, .. })),
            "flipped byte {position}: {result:?}"
        );
    }

    assert_eq!(decompress(&chunk, data.len(), true)?, data);

    Ok(())
}

#[test]
fn garbage_lzo_block_is_rejected() -> Result<()> {
    let data = vec![0u8; 4096];
    let mut chunk = compress(
        &data,
        BlockWriterOptions::builder()
            .method(CompressionMethod::Lzo)
            .block_size(4096)
            .build(),
    )?;
    let layout = BlockLayout::parse(&chunk)?;
    for byte in &mut chunk[layout.descriptors()[0].source_range()] {
        *byte = 0xFF;
    }

    for parallel in [false, true] {
        assert!(matches!(
            decompress_with(&chunk, data.len(), CompressionMethod::Lzo, parallel),
            Err(FormatError::CorruptBlock { index: 0, .. })
        ));
    }

    Ok(())
}

#[test]
fn capacity_is_checked_before_decoding() -> Result<()> {
    let data = sample(300);
    let chunk = compress(&data, BlockWriterOptions::builder().block_size(128).build())?;

    assert!(matches!(
        decompress(&chunk, 299, true),
        Err(FormatError::CapacityExceeded {
            required: 300,
            capacity: 299
        })
    ));

    let mut destination = [0u8; 100];
    assert!(matches!(
        decompress_into(&chunk, &mut destination, CompressionMethod::Zlib, false),
        Err(FormatError::CapacityExceeded { .. })
    ));
    assert!(destination.iter().all(|b| *b == 0));

    Ok(())
}

#[test]
fn chunk_must_start_with_magic() {
    let mut chunk = compress(b"payload", BlockWriterOptions::default()).unwrap();
    chunk[0] = 0;

    assert!(matches!(
        decompress(&chunk, 7, true),
        Err(FormatError::BadMagic)
    ));
    assert!(matches!(
        decompress(&[], 7, true),
        Err(FormatError::BadMagic)
    ));
}
