use crate::error::PermissionError;
use crate::media::capture::{AudioInput, CaptureDevice, SAMPLE_RATE};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, SampleFormat, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// One second of captured audio.
const BUFFER_SAMPLES: usize = SAMPLE_RATE as usize;

/// The default input device of the host audio system.
///
/// The cpal stream is not `Send`, so it lives on its own thread for as
/// long as the returned input is alive; samples cross over through a
/// lock-free ring buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCapture;

#[async_trait]
impl CaptureDevice for SystemCapture {
    async fn open(&self) -> Result<Box<dyn AudioInput>, PermissionError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        thread::Builder::new()
            .name("huddle-capture".into())
            .spawn(move || {
                let (producer, consumer) = HeapRb::<f32>::new(BUFFER_SAMPLES).split();
                let stream = match open_stream(producer) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if ready_tx.send(Ok(consumer)).is_err() {
                    return;
                }

                // Returns once the input is dropped.
                let _ = stop_rx.recv();
                drop(stream);
                debug!("Capture stream closed");
            })
            .map_err(|e| PermissionError::Unavailable(e.to_string()))?;

        let consumer = ready_rx
            .await
            .map_err(|_| PermissionError::Unavailable("capture thread exited".into()))??;

        info!("Microphone capture started");
        Ok(Box::new(SystemInput {
            consumer,
            _stop: stop_tx,
        }))
    }
}

struct SystemInput {
    consumer: HeapCons<f32>,
    _stop: std_mpsc::Sender<()>,
}

impl AudioInput for SystemInput {
    fn read_frame(&mut self, out: &mut [f32]) {
        let read = self.consumer.pop_slice(out);
        out[read..].fill(0.0);
    }
}

fn open_stream(mut producer: HeapProd<f32>) -> Result<Stream, PermissionError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| PermissionError::Unavailable("no input device".into()))?;

    let format = device
        .default_input_config()
        .map_err(|e| PermissionError::Unavailable(e.to_string()))?
        .sample_format();

    let config = StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };
    let err_fn = |e: cpal::StreamError| error!("Capture stream error: {}", e);

    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let written = producer.push_slice(data);
                if written < data.len() {
                    warn!("Capture buffer full, {} samples dropped", data.len() - written);
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                for sample in data {
                    if producer.try_push(*sample as f32 / i16::MAX as f32).is_err() {
                        warn!("Capture buffer full");
                        break;
                    }
                }
            },
            err_fn,
            None,
        ),
        other => {
            return Err(PermissionError::Unavailable(format!(
                "unsupported sample format {other:?}"
            )));
        }
    }
    .map_err(build_error)?;

    stream
        .play()
        .map_err(|e| PermissionError::Unavailable(e.to_string()))?;

    debug!("Capture stream open: {} Hz mono", SAMPLE_RATE);
    Ok(stream)
}

fn build_error(e: BuildStreamError) -> PermissionError {
    match e {
        BuildStreamError::DeviceNotAvailable => {
            PermissionError::Unavailable("input device went away".into())
        }
        other => PermissionError::Unavailable(other.to_string()),
    }
}
