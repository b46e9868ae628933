//! Parse throughput over generated CIM exports.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cimxml::{CimXmlParser, StatementSink, Triple};

/// Counts statements without keeping them, as an ingestion pipeline would
/// after handing triples off.
struct CountingSink {
    triples: u64,
}

impl StatementSink for CountingSink {
    fn triple(&mut self, triple: Triple) -> anyhow::Result<()> {
        black_box(&triple);
        self.triples += 1;
        Ok(())
    }
}

fn generate_cim_export(terminals: usize) -> Vec<u8> {
    let mut doc = String::with_capacity(terminals * 330 + 256);
    doc.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" \
         xmlns:cim=\"http://iec.ch/TC57/2013/CIM-schema-cim16#\">\n",
    );
    for i in 0..terminals {
        doc.push_str(&format!(
            "  <cim:Terminal rdf:ID=\"_t{i}\">\n    \
             <cim:IdentifiedObject.name>T{i}</cim:IdentifiedObject.name>\n    \
             <cim:ACDCTerminal.sequenceNumber rdf:datatype=\"http://www.w3.org/2001/XMLSchema#integer\">{}</cim:ACDCTerminal.sequenceNumber>\n    \
             <cim:Terminal.ConductingEquipment rdf:resource=\"#_eq{}\"/>\n  \
             </cim:Terminal>\n",
            i % 3 + 1,
            i / 2,
        ));
    }
    doc.push_str("</rdf:RDF>\n");
    doc.into_bytes()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.measurement_time(Duration::from_secs(10));

    for size in [100usize, 1_000, 10_000] {
        let doc = generate_cim_export(size);
        let parser = CimXmlParser::new()
            .with_base_iri("http://example.org/net")
            .unwrap();

        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::new("terminals", size), &doc, |b, doc| {
            b.iter(|| {
                let mut sink = CountingSink { triples: 0 };
                parser.parse_slice(doc, &mut sink).unwrap();
                black_box(sink.triples)
            });
        });
    }

    group.finish();
}

fn bench_buffer_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_capacity");
    let doc = generate_cim_export(1_000);

    for capacity in [256usize, 4 * 1024, 64 * 1024] {
        let parser = CimXmlParser::new()
            .with_base_iri("http://example.org/net")
            .unwrap()
            .with_buffer_capacity(capacity);

        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &doc, |b, doc| {
            b.iter(|| {
                let mut sink = CountingSink { triples: 0 };
                parser.parse_slice(doc, &mut sink).unwrap();
                black_box(sink.triples)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_buffer_capacity);
criterion_main!(benches);
