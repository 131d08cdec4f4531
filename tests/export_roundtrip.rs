use std::fs;
use std::io::Write;

use gradboard::pipeline::{self, FilterSelection};
use gradboard::{export, Attribute, Dataset, Metric, Record};
use pretty_assertions::assert_eq;
use tempfile::{NamedTempFile, TempDir};

const SOURCE: &str = "\
AN_BASE;NM_ENTIDADE_ENSINO;NM_REGIAO;DS_GRAU_ACADEMICO_DISCENTE;NM_DISCENTE;IDADE_APROX_DISCENTE;QT_MES_TITULACAO;DS_TIPO_NACIONALIDADE_DISCENTE;CS_STATUS_JURIDICO;DS_DEPENDENCIA_ADMINISTRATIVA;CD_CONCEITO_PROGRAMA
2019;UNIRIO;SUDESTE;MESTRADO;Silva, Ana;27;25;BRASILEIRO;PÚBLICA;FEDERAL;4
2019;UFPA;NORTE;DOUTORADO;Bruno Lima;36;52;BRASILEIRO;PÚBLICA;FEDERAL;5
2020;UNIRIO;SUDESTE;DOUTORADO;Carla Souza;31;49;ESTRANGEIRO;PÚBLICA;FEDERAL;4
2020;PUC-RIO;SUDESTE;MESTRADO;Diego Reis;;30;BRASILEIRO;PRIVADA;PRIVADA;7
2021;UNIRIO;SUDESTE;MESTRADO;Elisa Prado;25;24;BRASILEIRO;PÚBLICA;FEDERAL;4
";

fn source_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp source");
    file.write_all(SOURCE.as_bytes()).expect("write temp source");
    file
}

#[test]
fn load_sniffs_semicolons_and_records_source() {
    let file = source_file();
    let dataset = Dataset::load(file.path(), None).unwrap();

    assert_eq!(dataset.delimiter(), b';');
    assert_eq!(dataset.source(), file.path());
    assert_eq!(dataset.len(), 5);
    assert_eq!(dataset.records()[3].age, None);
}

#[test]
fn export_then_reload_preserves_schema_and_rows() {
    let file = source_file();
    let dataset = Dataset::load(file.path(), None).unwrap();
    let selection = FilterSelection::new().allow(Attribute::Region, ["SUDESTE"]);
    let filtered = pipeline::filter(dataset.records(), &selection);

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("dados_filtrados.csv");
    export::export_records(&output, dataset.headers(), &filtered).unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("AN_BASE,NM_ENTIDADE_ENSINO,NM_REGIAO,"));
    assert!(text.contains("\"Silva, Ana\""));

    let reloaded = Dataset::load(&output, Some(b',')).unwrap();
    assert_eq!(
        reloaded.headers().iter().collect::<Vec<_>>(),
        dataset.headers().iter().collect::<Vec<_>>()
    );
    assert_eq!(reloaded.len(), filtered.len());
    for (original, copy) in filtered.iter().zip(reloaded.records()) {
        assert_eq!(
            original.raw().iter().collect::<Vec<_>>(),
            copy.raw().iter().collect::<Vec<_>>()
        );
        assert_eq!(original.year, copy.year);
        assert_eq!(original.institution, copy.institution);
    }
}

#[test]
fn institution_drill_downs_share_the_filtered_set() {
    let file = source_file();
    let dataset = Dataset::load(file.path(), None).unwrap();
    let all: Vec<&Record> = dataset.records().iter().collect();

    let unirio = pipeline::filter_by_institution(&all, "UNIRIO");
    let trend: Vec<(i32, u64)> = pipeline::counts_by_year(&unirio)
        .into_iter()
        .map(|c| (c.year, c.count))
        .collect();
    assert_eq!(trend, vec![(2019, 1), (2020, 1), (2021, 1)]);

    let foreign =
        pipeline::filter_by_attribute(&unirio, Attribute::NationalityType, pipeline::FOREIGN_NATIONALITY);
    assert_eq!(foreign.len(), 1);
    assert_eq!(foreign[0].year, 2020);

    let ages = pipeline::distribution_by_year(&all, Metric::Age);
    let years: Vec<i32> = ages.iter().map(|d| d.year).collect();
    assert_eq!(years, vec![2019, 2020, 2021]);
    // the PUC-RIO row has no age
    assert_eq!(ages[1].count, 1);
    assert_eq!(ages[0].median, 31.5);
}
