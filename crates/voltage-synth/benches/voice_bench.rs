//! Criterion benchmarks for voltage-synth components
//!
//! Run with: cargo bench -p voltage-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use voltage_synth::{
    BlockContext, FilterType, MidiEvent, MonoVoice, Param, TimedEvent, Vcf, Vco, VoiceParams,
    Waveform,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ============================================================================
// VCO benchmarks
// ============================================================================

fn bench_vco_waveforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Vco");

    for waveform in Waveform::ALL {
        let name = Waveform::LABELS[waveform.index()];
        for &block_size in BLOCK_SIZES {
            let mut vco = Vco::new(SAMPLE_RATE);
            vco.set_waveform(waveform);
            vco.start_note(57, 1.0, 8192);

            group.bench_with_input(BenchmarkId::new(name, block_size), &block_size, |b, &size| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += vco.next_sample(0.0);
                    }
                    black_box(sum)
                })
            });
        }
    }

    group.finish();
}

// ============================================================================
// VCF benchmarks
// ============================================================================

fn bench_vcf(c: &mut Criterion) {
    let mut group = c.benchmark_group("Vcf");

    for (name, filter_type) in [("Analog", FilterType::Analog), ("Clean", FilterType::Clean)] {
        for &block_size in BLOCK_SIZES {
            let mut vcf = Vcf::new(SAMPLE_RATE);
            vcf.set_filter_type(filter_type);
            vcf.set_cutoff(1200.0);
            vcf.set_resonance(0.7);
            let mut buffer: Vec<f32> = (0..block_size)
                .map(|i| if i % 64 < 32 { 0.5 } else { -0.5 })
                .collect();

            group.bench_with_input(BenchmarkId::new(name, block_size), &block_size, |b, _| {
                b.iter(|| {
                    vcf.process_block(&mut buffer);
                    black_box(buffer[0])
                })
            });
        }
    }

    for &block_size in BLOCK_SIZES {
        let mut vcf = Vcf::new(SAMPLE_RATE);
        vcf.set_resonance(0.7);
        let cutoffs: Vec<f32> = (0..block_size)
            .map(|i| 200.0 + 8000.0 * i as f32 / block_size as f32)
            .collect();
        let mut buffer = vec![0.25f32; block_size];

        group.bench_with_input(
            BenchmarkId::new("AnalogSwept", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    vcf.process_block_modulated(&mut buffer, &cutoffs);
                    black_box(buffer[0])
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Full voice benchmarks
// ============================================================================

fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("MonoVoice");

    let presets = [
        ("Default", VoiceParams::default()),
        (
            "Swept",
            VoiceParams::default()
                .with(Param::VcfEgDepth, 0.8)
                .with(Param::ModDepth, 0.5)
                .with(Param::Resonance, 0.7),
        ),
    ];

    for (name, params) in &presets {
        for &block_size in BLOCK_SIZES {
            let mut voice = MonoVoice::new(SAMPLE_RATE, block_size);
            let start = [TimedEvent::new(
                0,
                MidiEvent::NoteOn {
                    pitch: 45,
                    velocity: 1.0,
                },
            )];
            let mut output = vec![0.0f32; block_size];
            voice.render_block(&mut output, &BlockContext::new(params).with_events(&start));

            group.bench_with_input(BenchmarkId::new(*name, block_size), &block_size, |b, _| {
                b.iter(|| {
                    voice.render_block(&mut output, &BlockContext::new(params));
                    black_box(output[0])
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_vco_waveforms, bench_vcf, bench_voice);
criterion_main!(benches);
