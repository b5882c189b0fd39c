pub mod elevenlabs;
pub mod groq;
