/// Plays a short arpeggio through the default output device. The engine
/// runs on the main thread against a `GraphClient`; the cpal callback owns
/// the `GraphWorker` and renders blocks.
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use trivox::graph::link;
use trivox::{SynthEngine, MAX_BLOCK_SIZE};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("no default output device available")?;
    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    let (client, mut worker) = link::link(sample_rate);
    let mut synth = SynthEngine::new(client);
    synth.toggle_poly_mode();

    let mut mono = [0.0f32; MAX_BLOCK_SIZE];
    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            for frames in data.chunks_mut(channels * MAX_BLOCK_SIZE) {
                let n = frames.len() / channels;
                worker.render(&mut mono[..n]);
                for (frame, &sample) in frames.chunks_mut(channels).zip(&mono[..n]) {
                    frame.fill(sample);
                }
            }
        },
        |err| eprintln!("stream error: {err}"),
        None,
    )?;
    stream.play()?;

    println!("Playing an arpeggio over the note catalog...");
    for &index in &[0usize, 2, 4, 7, 4, 2, 0] {
        let note = synth.note_catalog()[index];
        println!("  {} ({:.2}Hz)", note.label, note.frequency);
        synth.note_on(index)?;
        thread::sleep(Duration::from_millis(300));
        synth.note_off();
        thread::sleep(Duration::from_millis(100));
    }

    // Let the last release tail ring out, then reclaim the voices
    thread::sleep(Duration::from_millis(600));
    synth.reap();
    println!("Done ({} voices left)", synth.active_voices());
    Ok(())
}
