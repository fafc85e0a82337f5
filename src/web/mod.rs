//! HTTP API for resistance analysis.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! amr-caller serve
//!
//! # Custom port and reference directory
//! amr-caller serve --port 3000 --db-dir /data/amr/blast_db
//!
//! # Bind to all interfaces
//! amr-caller serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `POST /api/analyze` - Resistance analysis of an uploaded FASTA (multipart: `file`, `threshold`)
//! - `POST /api/blast` - Raw alignment hits (multipart: `file`, `evalue`, `max_hits`)
//! - `GET /api/genes` - Built-in resistance gene table
//! - `GET /api/reference-genes` - Reference sequence identifiers
//! - `GET /health` - Liveness and reference database status

pub mod server;
