// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A cpal-backed audio output.
//!
//! This crate only ever targets the demo CLI: it runs on whatever default
//! output device cpal finds and renders at the stream's native sample
//! rate rather than resampling to the device's preferred rate.

use std::result;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rb::{Producer, RbConsumer, RbProducer, SpscRb, RB};

use log::error;

pub trait AudioOutput {
    fn write(&mut self, decoded: &[i16]) -> Result<()>;
    fn flush(&mut self);
}

#[derive(Debug)]
pub enum AudioOutputError {
    OpenStreamError,
    PlayStreamError,
    StreamClosedError,
}

pub type Result<T> = result::Result<T, AudioOutputError>;

/// Number of interleaved `i16` samples the ring buffer can hold before a
/// [`CpalAudioOutput::write`] call blocks.
const RING_BUF_CAPACITY: usize = 8 * 1024;

pub struct CpalAudioOutput {
    ring_buf_producer: Producer<i16>,
    stream: cpal::Stream,
}

impl CpalAudioOutput {
    /// Opens the host's default output device for `channels` channels of
    /// interleaved `i16` PCM at `sample_rate`.
    pub fn try_open(channels: u16, sample_rate: u32) -> Result<Box<dyn AudioOutput>> {
        let host = cpal::default_host();

        let device = match host.default_output_device() {
            Some(device) => device,
            None => {
                error!("failed to get default audio output device");
                return Err(AudioOutputError::OpenStreamError);
            }
        };

        let config = cpal::StreamConfig {
            channels: channels as cpal::ChannelCount,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring_buf = SpscRb::<i16>::new(RING_BUF_CAPACITY);
        let (ring_buf_producer, ring_buf_consumer) = (ring_buf.producer(), ring_buf.consumer());

        let stream_result = device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                let written = ring_buf_consumer.read(data).unwrap_or(0);
                data[written..].iter_mut().for_each(|s| *s = 0);
            },
            move |err| error!("audio output error: {}", err),
        );

        let stream = match stream_result {
            Ok(stream) => stream,
            Err(err) => {
                error!("audio output stream open error: {}", err);
                return Err(AudioOutputError::OpenStreamError);
            }
        };

        if let Err(err) = stream.play() {
            error!("audio output stream play error: {}", err);
            return Err(AudioOutputError::PlayStreamError);
        }

        Ok(Box::new(CpalAudioOutput { ring_buf_producer, stream }))
    }
}

impl AudioOutput for CpalAudioOutput {
    fn write(&mut self, decoded: &[i16]) -> Result<()> {
        let mut i = 0;

        while i < decoded.len() {
            match self.ring_buf_producer.write_blocking(&decoded[i..]) {
                Some(written) => i += written,
                None => return Err(AudioOutputError::StreamClosedError),
            }
        }

        Ok(())
    }

    fn flush(&mut self) {
        let _ = self.stream.pause();
    }
}

pub fn try_open(channels: u16, sample_rate: u32) -> Result<Box<dyn AudioOutput>> {
    CpalAudioOutput::try_open(channels, sample_rate)
}
