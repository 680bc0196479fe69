use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn get_input() -> Vec<u8> {
    // Mildly repetitive data so every block actually compresses
    (0..0x40_0000u32)
        .map(|i| ((i / 7) ^ (i % 251)) as u8)
        .collect()
}

pub mod compress {
    use divan::Bencher;
    use gpk_compression::{compress, BlockWriterOptions, CompressionMethod};

    #[divan::bench(args = [false, true])]
    fn lzo(bencher: Bencher, parallel: bool) {
        bencher.with_inputs(super::get_input).bench_refs(|data| {
            divan::black_box(
                compress(
                    data,
                    BlockWriterOptions::builder()
                        .method(CompressionMethod::Lzo)
                        .parallel(parallel)
                        .build(),
                )
                .unwrap(),
            );
        });
    }

    #[divan::bench(sample_count = 10)]
    fn zlib(bencher: Bencher) {
        bencher.with_inputs(super::get_input).bench_refs(|data| {
            divan::black_box(
                compress(
                    data,
                    BlockWriterOptions::builder()
                        .method(CompressionMethod::Zlib)
                        .build(),
                )
                .unwrap(),
            );
        });
    }
}

pub mod decompress {
    use divan::Bencher;
    use gpk_compression::{
        compress, decompress_with, BlockLayout, BlockWriterOptions, CompressionMethod,
    };

    fn get_chunk(method: CompressionMethod) -> (Vec<u8>, usize) {
        let data = super::get_input();
        let chunk = compress(&data, BlockWriterOptions::builder().method(method).build()).unwrap();
        (chunk, data.len())
    }

    #[divan::bench]
    fn layout(bencher: Bencher) {
        bencher
            .with_inputs(|| get_chunk(CompressionMethod::Lzo).0)
            .bench_refs(|chunk| {
                divan::black_box(BlockLayout::parse(chunk).unwrap());
            });
    }

    #[divan::bench(args = [false, true])]
    fn lzo(bencher: Bencher, parallel: bool) {
        bencher
            .with_inputs(|| get_chunk(CompressionMethod::Lzo))
            .bench_refs(|(chunk, size)| {
                divan::black_box(
                    decompress_with(chunk, *size, CompressionMethod::Lzo, parallel).unwrap(),
                );
            });
    }

    #[divan::bench(args = [false, true])]
    fn zlib(bencher: Bencher, parallel: bool) {
        bencher
            .with_inputs(|| get_chunk(CompressionMethod::Zlib))
            .bench_refs(|(chunk, size)| {
                divan::black_box(
                    decompress_with(chunk, *size, CompressionMethod::Zlib, parallel).unwrap(),
                );
            });
    }
}
