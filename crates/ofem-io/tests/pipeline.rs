//! End-to-end conversions: S2K text to deck and msh, s3dx to model, and the
//! archive cycle around a fake solver run.

use std::fs;

use ofem_io::{
    DeckOptions, DeckWriter, EntityGrouping, InMemoryKernel, MeshExport, archive_path,
    compress_job, extract_job, import_discrete, parse_s3dx, read_csv,
};
use ofem_model::{ElementShape, ModelDefaults, StructuralModel};
use ofem_s2k::S2kReader;

const PORTAL: &str = r#"File C:\models\portal.s2k was saved on m/d/yy at h:mm:ss

TABLE:  "PROGRAM CONTROL"
   ProgramName=SAP2000   Version=14.0.0   CurrUnits="KN, m, C"

TABLE:  "JOINT COORDINATES"
   Joint=1   CoordSys=GLOBAL   CoordType=Cartesian   XorR=0   Y=0   Z=0
   Joint=2   CoordSys=GLOBAL   CoordType=Cartesian   XorR=0   Y=0   Z=3
   Joint=3   CoordSys=GLOBAL   CoordType=Cartesian   XorR=5   Y=0   Z=3
   Joint=4   CoordSys=GLOBAL   CoordType=Cartesian   XorR=5   Y=0   Z=0

TABLE:  "JOINT RESTRAINT ASSIGNMENTS"
   Joint=1   U1=Yes   U2=Yes   U3=Yes   R1=Yes   R2=Yes   R3=Yes
   Joint=4   U1=Yes   U2=Yes   U3=Yes   R1=No   R2=No   R3=No

TABLE:  "CONNECTIVITY - FRAME"
   Frame=10   JointI=1   JointJ=2   IsCurved=No
   Frame=11   JointI=2   JointJ=3   IsCurved=No
   Frame=12   JointI=3   JointJ=4 _
        IsCurved=No

TABLE:  "FRAME SECTION ASSIGNMENTS"
   Frame=10   AnalSect=COL   MatProp=Default
   Frame=11   AnalSect=BEAM   MatProp=Default
   Frame=12   AnalSect=COL   MatProp=Default

TABLE:  "FRAME SECTION PROPERTIES 01 - GENERAL"
   SectionName=COL   Material=S355   Area=0.012   TorsConst=1E-06   I33=0.0002   I22=0.00006
   SectionName=BEAM   Material=S355   Area=0.008   TorsConst=5E-07   I33=0.00015   I22=0.00003

TABLE:  "MATERIAL PROPERTIES 01 - GENERAL"
   Material=S355   Type=Steel

TABLE:  "MATERIAL PROPERTIES 02 - BASIC MECHANICAL PROPERTIES"
   Material=S355   UnitWeight=76.97   UnitMass=7.849   E1=210000000   G12=80769231   U12=0.3   A1=1.2E-05

TABLE:  "GROUPS 1 - DEFINITIONS"
   GroupName=Columns

TABLE:  "GROUPS 2 - ASSIGNMENTS"
   GroupName=Columns   ObjectType=Frame   ObjectLabel=10
   GroupName=Columns   ObjectType=Frame   ObjectLabel=12

END TABLE DATA
"#;

fn portal() -> StructuralModel {
    let tables = S2kReader::parse_str(PORTAL).expect("tables");
    StructuralModel::from_tables(tables, &ModelDefaults::default()).expect("model")
}

#[test]
fn portal_frame_deck() {
    let model = portal();
    assert_eq!(model.joint_count(), 4);
    assert_eq!(model.frame_count(), 3);
    assert_eq!(model.boundaries().len(), 2);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("portal.gldat");
    DeckWriter::new(&model, DeckOptions::default())
        .write(&path)
        .expect("deck");
    let deck = fs::read_to_string(&path).expect("read deck");

    assert!(deck.contains("    3 # nelem (n. of elements in the mesh)"));
    assert!(deck.contains("    2 # nvfix (n. of points with fixed degrees of freedom)"));
    // COL and BEAM give two parameter sets sharing one material
    assert!(deck.contains("    2 # nselp (n. of sets of element parameters)"));
    assert!(deck.contains("    1 # nmats (n. of sets of material properties)"));
    assert!(deck.contains("      1   2.100000E+08   3.000000E-01   7.849000E+00   1.200000E-05\n"));
    assert!(deck.contains("      3     1     1      1            3        4\n"));
    assert!(deck.contains("      2     2     1      2            2        3\n"));
    assert!(deck.contains("      1      1          1 1 1 1 1 1\n"));
    assert!(deck.contains("      2      4          1 1 1 0 0 0\n"));
}

#[test]
fn portal_frame_msh_with_groups() {
    let model = portal();
    let mut kernel = InMemoryKernel::new();
    MeshExport::new(&model)
        .grouping(EntityGrouping::Elements)
        .section_physicals(true)
        .export(&mut kernel)
        .expect("export");

    let msh = kernel.render_msh();
    assert!(msh.contains("1 1 \"section: COL\""));
    assert!(msh.contains("1 2 \"section: BEAM\""));
    assert!(msh.contains("1 3 \"Group: Columns\""));
    assert!(msh.contains("$Nodes\n4\n"));
    // element 2 sits on the beam entity and carries the BEAM physical
    assert!(msh.contains("\n2 1 2 2 2 2 3\n"));
}

#[test]
fn s3dx_mesh_to_deck_and_msh() {
    let mesh = parse_s3dx(
        "s3dx\nslab strip\n2 6 1\n1 9 4 1 2 5 4\n2 9 4 2 3 6 5\n\
         1 0 0 0\n2 1 0 0\n3 2 0 0\n4 0 1 0\n5 1 1 0\n6 2 1 0\n1 1\n",
    )
    .expect("s3dx");

    let mut kernel = InMemoryKernel::new();
    import_discrete(&mesh, &mut kernel).expect("import");
    assert_eq!(kernel.node_count(), 6);
    assert_eq!(kernel.element_count(), 2);

    let model = StructuralModel::from_mesh(&mesh, &ModelDefaults::default()).expect("model");
    assert!(model.elements().iter().all(|e| e.shape() == Some(ElementShape::Quad)));
    let deck = DeckWriter::new(&model, DeckOptions::default())
        .render()
        .expect("deck");
    assert!(deck.starts_with("### Main title of the problem\n"));
    assert!(deck.contains("    1 # nvfix"));
}

#[test]
fn archive_cycle_around_a_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("portal");
    DeckWriter::new(&portal(), DeckOptions::default())
        .write(dir.path().join("portal.gldat"))
        .expect("deck");
    for suffix in ["_gl.bin", "_re.bin", "_di.bin", "_sd.bin"] {
        fs::write(dir.path().join(format!("portal{suffix}")), [0u8, 1, 2, 3]).expect("bin");
    }
    fs::write(dir.path().join("portal_di.csv"), "point;disp-z\n1;0.0\n2;-0.004\n").expect("csv");

    compress_job(&base).expect("compress");
    assert!(archive_path(&base).exists());
    assert!(!dir.path().join("portal.gldat").exists());

    let restored = extract_job(&base).expect("extract");
    assert_eq!(restored.len(), 6);
    let table = read_csv(dir.path().join("portal_di.csv")).expect("csv");
    assert_eq!(table.numbers("disp-z").expect("numbers"), vec![0.0, -0.004]);
}
