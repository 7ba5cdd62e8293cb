//! FF1 format-preserving encryption (NIST SP 800-38G).
//!
//! Encrypts (or decrypts) the selected numeral string in place: the
//! output has the same length and alphabet as the input. The AES key is
//! read base64-encoded from an environment variable at build time; an
//! optional sibling field supplies the per-record tweak.
//!
//! The implementation works with 128-bit arithmetic, which bounds the
//! numeral string length to `floor(96 / log2(radix))` digits per half —
//! 57 characters in total for radix 10, ample for identifiers, card and
//! account numbers.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use anyhow::{Context, Result, anyhow, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::config::{Ff1Config, MaskingRule};
use crate::masks::MaskEngine;
use crate::selector::PathSelector;
use crate::value::{Record, Value};

const ROUNDS: u32 = 10;

enum AesKey {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl AesKey {
    fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Ok(AesKey::Aes128(Aes128::new(GenericArray::from_slice(key)))),
            24 => Ok(AesKey::Aes192(Aes192::new(GenericArray::from_slice(key)))),
            32 => Ok(AesKey::Aes256(Aes256::new(GenericArray::from_slice(key)))),
            n => bail!("ff1: the key must be 16, 24 or 32 bytes, got {n}"),
        }
    }

    fn encrypt(&self, block: &mut [u8; 16]) {
        let data = GenericArray::from_mut_slice(block);
        match self {
            AesKey::Aes128(cipher) => cipher.encrypt_block(data),
            AesKey::Aes192(cipher) => cipher.encrypt_block(data),
            AesKey::Aes256(cipher) => cipher.encrypt_block(data),
        }
    }

    /// CBC-MAC over `data`, whose length must be a multiple of 16.
    fn prf(&self, data: &[u8]) -> [u8; 16] {
        let mut block = [0u8; 16];
        for chunk in data.chunks_exact(16) {
            for (b, c) in block.iter_mut().zip(chunk) {
                *b ^= c;
            }
            self.encrypt(&mut block);
        }
        block
    }
}

pub struct Ff1Engine {
    key: AesKey,
    radix: u32,
    tweak_field: Option<PathSelector>,
    decrypt: bool,
}

impl Ff1Engine {
    pub fn new(config: &Ff1Config) -> Result<Self> {
        if !(2..=36).contains(&config.radix) {
            bail!("ff1: the radix must be between 2 and 36, got {}", config.radix);
        }
        let encoded = std::env::var(&config.key_from_env).with_context(|| {
            format!("ff1: environment variable '{}' is not set", config.key_from_env)
        })?;
        let key = BASE64
            .decode(encoded.trim())
            .with_context(|| format!("ff1: decode the key from '{}'", config.key_from_env))?;
        let tweak_field = config
            .tweak_field
            .as_deref()
            .map(PathSelector::new)
            .transpose()?;
        Ok(Self {
            key: AesKey::new(&key)?,
            radix: config.radix,
            tweak_field,
            decrypt: config.decrypt,
        })
    }

    fn digits(&self, text: &str) -> Result<Vec<u32>> {
        text.chars()
            .map(|c| {
                c.to_digit(self.radix)
                    .ok_or_else(|| anyhow!("ff1: character '{c}' is invalid for radix {}", self.radix))
            })
            .collect()
    }

    fn tweak(&self, context: &[Record]) -> Result<Vec<u8>> {
        match (&self.tweak_field, context.first()) {
            (Some(selector), Some(record)) => {
                let value = selector.read(record).ok_or_else(|| {
                    anyhow!("ff1: tweak field '{}' not found in the record", selector.path())
                })?;
                Ok(value.render().into_bytes())
            }
            (Some(selector), None) => {
                Err(anyhow!("ff1: no record context to read '{}' from", selector.path()))
            }
            (None, _) => Ok(Vec::new()),
        }
    }

    fn transform(&self, text: &str, tweak: &[u8]) -> Result<String> {
        let digits = self.digits(text)?;
        let n = digits.len();
        if n < 2 {
            bail!("ff1: the numeral string must have at least 2 characters");
        }
        let u = n / 2;
        let v = n - u;

        // bytes needed for one half; 128-bit arithmetic caps it at 12
        let bits = (v as f64 * (self.radix as f64).log2()).ceil() as usize;
        let b = bits.div_ceil(8);
        if b > 12 {
            bail!("ff1: the value is too long for radix {} ({n} characters)", self.radix);
        }
        let d = 4 * b.div_ceil(4) + 4;

        let radix = self.radix as u128;
        let t = tweak.len();

        let mut p = [0u8; 16];
        p[0] = 1;
        p[1] = 2;
        p[2] = 1;
        p[3..6].copy_from_slice(&(self.radix.to_be_bytes())[1..4]);
        p[6] = 10;
        p[7] = (u % 256) as u8;
        p[8..12].copy_from_slice(&(n as u32).to_be_bytes());
        p[12..16].copy_from_slice(&(t as u32).to_be_bytes());

        let mut half_a: Vec<u32> = digits[..u].to_vec();
        let mut half_b: Vec<u32> = digits[u..].to_vec();
        let pad = (16 - ((t + b + 1) % 16)) % 16;

        let round_y = |i: u32, source: &[u32], modulus: u128| -> u128 {
            let mut q = Vec::with_capacity(t + pad + 1 + b);
            q.extend_from_slice(tweak);
            q.resize(t + pad, 0);
            q.push(i as u8);
            let num = numeral_value(source, radix);
            q.extend_from_slice(&num.to_be_bytes()[16 - b..]);

            let mut data = Vec::with_capacity(16 + q.len());
            data.extend_from_slice(&p);
            data.extend_from_slice(&q);
            let r = self.key.prf(&data);

            // fold S into y modulo radix^m to stay inside 128 bits
            r[..d].iter().fold(0u128, |y, &byte| {
                (y * 256 + byte as u128) % modulus
            })
        };

        if self.decrypt {
            for i in (0..ROUNDS).rev() {
                let m = if i % 2 == 0 { u } else { v };
                let modulus = radix.pow(m as u32);
                let y = round_y(i, &half_a, modulus);
                let c = (numeral_value(&half_b, radix) % modulus + modulus - y) % modulus;
                half_b = half_a;
                half_a = numeral_string(c, radix, m);
            }
        } else {
            for i in 0..ROUNDS {
                let m = if i % 2 == 0 { u } else { v };
                let modulus = radix.pow(m as u32);
                let y = round_y(i, &half_b, modulus);
                let c = (numeral_value(&half_a, radix) % modulus + y) % modulus;
                half_a = half_b;
                half_b = numeral_string(c, radix, m);
            }
        }

        let mut out = String::with_capacity(n);
        for digit in half_a.iter().chain(half_b.iter()) {
            out.push(char::from_digit(*digit, self.radix).expect("digit is below the radix"));
        }
        Ok(out)
    }
}

fn numeral_value(digits: &[u32], radix: u128) -> u128 {
    digits
        .iter()
        .fold(0u128, |acc, &d| acc * radix + d as u128)
}

fn numeral_string(mut value: u128, radix: u128, length: usize) -> Vec<u32> {
    let mut digits = vec![0u32; length];
    for slot in digits.iter_mut().rev() {
        *slot = (value % radix) as u32;
        value /= radix;
    }
    digits
}

impl MaskEngine for Ff1Engine {
    fn mask(&mut self, entry: Value, context: &[Record]) -> Result<Value> {
        let Value::String(text) = &entry else {
            bail!("ff1: the selected value '{}' is not a string", entry.render());
        };
        let tweak = self.tweak(context)?;
        Ok(Value::String(self.transform(text, &tweak)?))
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.ff1 {
        Some(config) => Ok(Some(Box::new(Ff1Engine::new(config)?))),
        None => Ok(None),
    }
}
