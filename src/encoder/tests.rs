use super::*;
    use crate::constants::{MAXIMUM_INDEX, XML_DECLARATION, XML_NAMESPACE_NAME};
    use crate::options::CharacterEncodingScheme;

    const HEADER: [u8; 5] = [0xE0, 0x00, 0x00, 0x01, 0x00];

    fn started(options: SerializerOptions) -> Encoder {
        let mut enc = Encoder::new(options);
        enc.start_document().unwrap();
        enc
    }

    fn finished(mut enc: Encoder) -> Vec<u8> {
        enc.end_document().unwrap();
        enc.finish().unwrap()
    }

    /// Header gefolgt von `body`.
    fn doc(body: &[&[u8]]) -> Vec<u8> {
        let mut v = HEADER.to_vec();
        for part in body {
            v.extend_from_slice(part);
        }
        v
    }

    // ========================================================================
    // Schritt 1: Dokument-Rahmen und Terminatoren
    // ========================================================================

    /// Leeres Element: Element-Ende und Dokument-Ende ergeben `FF`.
    #[test]
    fn single_empty_element() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        assert_eq!(finished(enc), doc(&[&[0x3C, 0x00, b'r', 0xFF]]));
    }

    /// Element mit Text; der Chunk wird mit Add-to-table-Flag geschrieben.
    #[test]
    fn element_with_text() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("root"), &[], &[]).unwrap();
        enc.characters("hi").unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0x3C, 0x03], b"root", &[0x91], b"hi", &[0xFF]])
        );
    }

    /// Drei geschachtelte Enden: zwei `FF`, das letzte zusammen mit dem
    /// Dokument-Terminator.
    #[test]
    fn nested_terminators_are_combined() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("a"), &[], &[]).unwrap();
        enc.start_element(NameRef::local("b"), &[], &[]).unwrap();
        enc.start_element(NameRef::local("c"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        enc.end_element().unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0x3C, 0x00, b'a', 0x3C, 0x00, b'b', 0x3C, 0x00, b'c', 0xFF, 0xFF]])
        );
    }

    /// XML-Deklaration vor dem Binary-Header.
    #[test]
    fn xml_declaration_option() {
        let mut enc = started(SerializerOptions::default().with_xml_declaration(true));
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        let bytes = finished(enc);
        assert!(bytes.starts_with(XML_DECLARATION));
        assert_eq!(&bytes[XML_DECLARATION.len()..][..5], &HEADER);
    }

    // ========================================================================
    // Schritt 2: Namen und Namespaces
    // ========================================================================

    /// Zwei Geschwister `{http://ns1}foo`: erst literal, dann Index 1.
    #[test]
    fn sibling_elements_use_index_on_second_occurrence() {
        let ns = [NamespaceRef::new("", "http://ns1")];
        let foo = NameRef::new("", "http://ns1", "foo");
        let mut enc = started(SerializerOptions::default());
        enc.start_element(foo, &ns, &[]).unwrap();
        enc.end_element().unwrap();
        enc.start_element(foo, &ns, &[]).unwrap();
        enc.end_element().unwrap();
        let bytes = finished(enc);

        let expected = doc(&[
            &[0x38, 0xCD, 0x09],
            b"http://ns1",
            &[0xF0, 0x3D, 0x81, 0x02],
            b"foo",
            &[0xF0],
            &[0x38, 0xCD, 0x81, 0xF0, 0x00],
            &[0xFF],
        ]);
        assert_eq!(bytes, expected);
    }

    /// Präfixierter Name: Prefix- und Namespace-Index im Literal.
    #[test]
    fn prefixed_literal_name() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(
            NameRef::new("p", "urn:p", "a"),
            &[NamespaceRef::new("p", "urn:p")],
            &[],
        )
        .unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[
                &[0x38, 0xCF, 0x00, b'p', 0x04],
                b"urn:p",
                &[0xF0, 0x3F, 0x81, 0x81, 0x00, b'a', 0xFF],
            ])
        );
    }

    /// Der vordefinierte `xml`-Prefix braucht keine Deklaration.
    #[test]
    fn builtin_xml_prefix_is_indexed() {
        let mut enc = started(SerializerOptions::default());
        let lang = AttributeRef::new(NameRef::new("xml", XML_NAMESPACE_NAME, "lang"), "");
        enc.start_element(NameRef::local("r"), &[], &[lang]).unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0x7C, 0x00, b'r', 0x7B, 0x80, 0x80, 0x03], b"lang", &[0xFF, 0xFF, 0xF0]])
        );
    }

    /// Gleicher Local-Name in zwei Namespaces: zwei Einträge.
    #[test]
    fn same_local_name_different_namespaces() {
        let mut enc = started(SerializerOptions::default());
        let decls = [NamespaceRef::new("a", "urn:a"), NamespaceRef::new("b", "urn:b")];
        enc.start_element(NameRef::local("r"), &decls, &[]).unwrap();
        enc.start_element(NameRef::new("a", "urn:a", "x"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        enc.start_element(NameRef::new("b", "urn:b", "x"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        enc.end_element().unwrap();
        assert_eq!(enc.vocabulary().element_name.len(), 3);
        // Local-Name "x" nur einmal in der Tabelle
        assert_eq!(enc.vocabulary().local_name.get("x"), Some(2));
    }

    /// Literaler Name mit unbekanntem Namespace wird abgelehnt.
    #[test]
    fn undeclared_namespace_rejected() {
        let mut enc = started(SerializerOptions::default());
        let err = enc
            .start_element(NameRef::new("", "urn:x", "a"), &[], &[])
            .unwrap_err();
        assert_eq!(err, Error::NamespaceNotIndexed("urn:x".into()));
    }

    /// Literaler Name mit unbekanntem Prefix wird abgelehnt.
    #[test]
    fn undeclared_prefix_rejected() {
        let mut enc = started(SerializerOptions::default());
        let err = enc
            .start_element(
                NameRef::new("q", "urn:x", "a"),
                &[NamespaceRef::new("", "urn:x")],
                &[],
            )
            .unwrap_err();
        assert_eq!(err, Error::PrefixNotIndexed("q".into()));
    }

    /// Prefix ohne Namespace wird im Literal ignoriert.
    #[test]
    fn prefix_without_namespace_ignored() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::new("q", "", "a"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        assert_eq!(finished(enc), doc(&[&[0x3C, 0x00, b'a', 0xFF]]));
    }

    /// Undeclaration des Default-Namespace: Namespace-Attribut ohne Strings.
    #[test]
    fn default_namespace_undeclaration() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("a"), &[NamespaceRef::new("", "")], &[])
            .unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0x38, 0xCC, 0xF0, 0x3C, 0x00, b'a', 0xFF]])
        );
    }

    // ========================================================================
    // Schritt 3: Attribute
    // ========================================================================

    /// Size constraint 8: "hello" (5) tabellenfähig, "0123456789" (10) nicht.
    #[test]
    fn attribute_value_size_constraint() {
        let opts = SerializerOptions::default().with_attribute_value_size_constraint(8);
        let mut enc = started(opts);
        let attrs = [
            AttributeRef::new(NameRef::local("a"), "hello"),
            AttributeRef::new(NameRef::local("b"), "0123456789"),
        ];
        enc.start_element(NameRef::local("e"), &[], &attrs).unwrap();
        enc.end_element().unwrap();
        let bytes = finished(enc);

        let expected = doc(&[
            &[0x7C, 0x00, b'e'],
            &[0x78, 0x00, b'a', 0x44],
            b"hello",
            &[0x78, 0x00, b'b', 0x08, 0x01],
            b"0123456789",
            &[0xFF, 0xF0],
        ]);
        assert_eq!(bytes, expected);
        // 0x44: Add-to-table-Bit gesetzt; 0x08: nicht gesetzt
        assert_ne!(expected[11] & 0x40, 0);
        assert_eq!(expected[20] & 0x40, 0);
    }

    /// Wiederholte Attribute: Name und Wert als Index.
    #[test]
    fn repeated_attribute_uses_indices() {
        let mut enc = started(SerializerOptions::default());
        let attrs = [AttributeRef::new(NameRef::local("a"), "x")];
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.start_element(NameRef::local("e"), &[], &attrs).unwrap();
        enc.end_element().unwrap();
        enc.start_element(NameRef::local("e"), &[], &attrs).unwrap();
        enc.end_element().unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[
                &[0x3C, 0x00, b'r'],
                &[0x7C, 0x00, b'e', 0x78, 0x00, b'a', 0x40, b'x'],
                &[0xFF],
                &[0x41, 0x00, 0x80],
                &[0xFF, 0xFF],
            ])
        );
    }

    /// Leerer Attributwert: `FF`.
    #[test]
    fn empty_attribute_value() {
        let mut enc = started(SerializerOptions::default());
        let attrs = [AttributeRef::new(NameRef::local("a"), "")];
        enc.start_element(NameRef::local("e"), &[], &attrs).unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0x7C, 0x00, b'e', 0x78, 0x00, b'a', 0xFF, 0xFF, 0xF0]])
        );
    }

    /// Memory-Limit verhindert weitere Tabelleneinträge.
    #[test]
    fn attribute_value_memory_limit() {
        let opts = SerializerOptions::default().with_attribute_value_map_memory_limit(4);
        let mut enc = started(opts);
        let attrs = [
            AttributeRef::new(NameRef::local("a"), "abc"),
            AttributeRef::new(NameRef::local("b"), "de"),
        ];
        enc.start_element(NameRef::local("e"), &[], &attrs).unwrap();
        assert_eq!(enc.vocabulary().attribute_value.len(), 1);
        assert_eq!(enc.vocabulary().attribute_value.get("de"), None);
    }

    /// UTF-16 für Attributwerte.
    #[test]
    fn utf16_attribute_value() {
        let opts = SerializerOptions::default()
            .with_character_encoding_scheme(CharacterEncodingScheme::Utf16);
        let mut enc = started(opts);
        let attrs = [AttributeRef::new(NameRef::local("a"), "v")];
        enc.start_element(NameRef::local("e"), &[], &attrs).unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0x7C, 0x00, b'e', 0x78, 0x00, b'a', 0x51, 0x00, b'v', 0xFF, 0xF0]])
        );
    }

    // ========================================================================
    // Schritt 4: Character Chunks, CDATA, Kommentare, PIs, DTD
    // ========================================================================

    /// Wiederholter Chunk wird als Index referenziert.
    #[test]
    fn repeated_chunk_indexed() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.characters("hi").unwrap();
        enc.comment("").unwrap();
        enc.characters("hi").unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[
                &[0x3C, 0x00, b'r', 0x91],
                b"hi",
                &[0xE2, 0xFF, 0xA0, 0xFF],
            ])
        );
    }

    /// Chunks ab der Größengrenze gehen nicht in die Tabelle.
    #[test]
    fn long_chunk_not_added() {
        let opts = SerializerOptions::default().with_character_content_chunk_size_constraint(2);
        let mut enc = started(opts);
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.characters("ab").unwrap();
        enc.characters("a").unwrap();
        assert_eq!(enc.vocabulary().character_content_chunk.len(), 1);
        assert_eq!(enc.vocabulary().character_content_chunk.get("a"), Some(1));
        // "ab": 0x80 ohne Add-Flag, Länge 2 → 0x81
        assert_eq!(&enc.bytes()[8..11], &[0x81, b'a', b'b']);
    }

    /// UTF-16 Chunk: Länge in Octets, mittlerer Bereich ab 3.
    #[test]
    fn utf16_chunk() {
        let opts = SerializerOptions::default()
            .with_character_encoding_scheme(CharacterEncodingScheme::Utf16);
        let mut enc = started(opts);
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.characters("hi").unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0x3C, 0x00, b'r', 0x96, 0x01, 0x00, b'h', 0x00, b'i', 0xFF]])
        );
    }

    /// Leerer Text erzeugt nichts.
    #[test]
    fn empty_characters_ignored() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        let before = enc.buf_len();
        enc.characters("").unwrap();
        enc.cdata("").unwrap();
        assert_eq!(enc.buf_len(), before);
    }

    /// CDATA über den eingebauten Algorithmus 9.
    #[test]
    fn cdata_section() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.cdata("ab").unwrap();
        enc.cdata("ab").unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0x3C, 0x00, b'r', 0x8C, 0x25, b'a', b'b', 0x8C, 0x25, b'a', b'b', 0xFF]])
        );
    }

    /// Kommentar: literal beim ersten, Index beim zweiten Auftreten.
    #[test]
    fn comments_use_other_string_table() {
        let mut enc = started(SerializerOptions::default());
        enc.comment("c").unwrap();
        enc.comment("c").unwrap();
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0xE2, 0x40, b'c', 0xE2, 0x80, 0x3C, 0x00, b'r', 0xFF]])
        );
    }

    /// Processing Instruction mit und ohne Daten.
    #[test]
    fn processing_instructions() {
        let mut enc = started(SerializerOptions::default());
        enc.processing_instruction("t", "d").unwrap();
        enc.processing_instruction("t", "").unwrap();
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[
                0xE1, 0x00, b't', 0x40, b'd', 0xE1, 0x80, 0xFF, 0x3C, 0x00, b'r', 0xFF
            ]])
        );
    }

    /// PI ohne Target ist ein Strukturfehler.
    #[test]
    fn processing_instruction_requires_target() {
        let mut enc = started(SerializerOptions::default());
        let err = enc.processing_instruction("", "x").unwrap_err();
        assert!(matches!(err, Error::StructuralError(_)));
    }

    /// DTD: System-ID, danach ein Terminator für die leere Child-Liste.
    #[test]
    fn document_type_declaration() {
        let mut enc = started(SerializerOptions::default());
        enc.document_type_declaration(Some("s.dtd"), None).unwrap();
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        assert_eq!(
            finished(enc),
            doc(&[&[0xC6, 0x04], b"s.dtd", &[0xF0, 0x3C, 0x00, b'r', 0xFF]])
        );
    }

    /// DTD innerhalb eines Elements wird abgelehnt.
    #[test]
    fn document_type_declaration_inside_element() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        assert!(enc.document_type_declaration(Some("s"), None).is_err());
    }

    // ========================================================================
    // Schritt 5: Zustandsfehler, Reset, Flush
    // ========================================================================

    #[test]
    fn end_element_without_open_element() {
        let mut enc = started(SerializerOptions::default());
        assert_eq!(enc.end_element().unwrap_err(), Error::UnbalancedEndElement);
    }

    #[test]
    fn events_after_end_document_rejected() {
        let mut enc = started(SerializerOptions::default());
        enc.end_document().unwrap();
        assert!(enc.is_finished());
        assert_eq!(enc.characters("x").unwrap_err(), Error::DocumentFinished);
        assert_eq!(enc.start_document().unwrap_err(), Error::DocumentFinished);
    }

    #[test]
    fn events_before_start_document_rejected() {
        let mut enc = Encoder::new(SerializerOptions::default());
        assert!(matches!(
            enc.start_element(NameRef::local("r"), &[], &[]),
            Err(Error::StructuralError(_))
        ));
    }

    #[test]
    fn end_document_with_open_element() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        let err = enc.end_document().unwrap_err();
        assert!(err.to_string().contains("still open"));
    }

    #[test]
    fn finish_requires_end_document() {
        let enc = started(SerializerOptions::default());
        assert!(enc.finish().is_err());
    }

    /// Nach `reset()` beginnt das Vocabulary von vorn: gleiche Bytes.
    #[test]
    fn reset_starts_fresh_session() {
        let write = |enc: &mut Encoder| {
            enc.start_document().unwrap();
            enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
            enc.characters("x").unwrap();
            enc.end_element().unwrap();
            enc.end_document().unwrap();
        };
        let mut enc = Encoder::new(SerializerOptions::default());
        write(&mut enc);
        let first = enc.bytes().to_vec();
        enc.reset();
        assert_eq!(enc.buf_len(), 0);
        assert_eq!(enc.depth(), 0);
        write(&mut enc);
        assert_eq!(enc.bytes(), &first[..]);
    }

    /// Periodisches Flushen liefert dieselben Bytes wie ein Durchgang.
    #[test]
    fn flush_to_streams_same_bytes() {
        let mut out = Vec::new();
        let mut enc = started(SerializerOptions::default());
        enc.flush_to(&mut out).unwrap();
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        for _ in 0..3 {
            enc.start_element(NameRef::local("c"), &[], &[]).unwrap();
            enc.characters("t").unwrap();
            enc.end_element().unwrap();
            enc.flush_to(&mut out).unwrap();
            assert_eq!(enc.buf_len(), 0);
        }
        enc.end_element().unwrap();
        enc.end_document().unwrap();
        enc.finish_to(&mut out).unwrap();

        let mut reference = started(SerializerOptions::default());
        reference.start_element(NameRef::local("r"), &[], &[]).unwrap();
        for _ in 0..3 {
            reference.start_element(NameRef::local("c"), &[], &[]).unwrap();
            reference.characters("t").unwrap();
            reference.end_element().unwrap();
        }
        reference.end_element().unwrap();
        assert_eq!(out, finished(reference));
    }

    // ========================================================================
    // Volle Tabellen (X.891 C.25: höchstens 2^20 Indizes)
    // ========================================================================

    /// Ist die Chunk-Tabelle voll, geht jeder neue Chunk literal ohne
    /// Add-Flag raus, auch bei Wiederholung.
    #[test]
    fn full_chunk_table_falls_back_to_literals() {
        let mut enc = started(SerializerOptions::default());
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        for i in 0..=MAXIMUM_INDEX {
            enc.characters(&format!("c{i}")).unwrap();
            if enc.buf_len() > 1 << 16 {
                enc.flush_to(&mut std::io::sink()).unwrap();
            }
        }
        assert!(enc.vocabulary().character_content_chunk.is_full());
        assert_eq!(enc.vocabulary().character_content_chunk.len(), MAXIMUM_INDEX);

        enc.flush_to(&mut std::io::sink()).unwrap();
        let last = format!("c{MAXIMUM_INDEX}");
        enc.characters(&last).unwrap();
        // 0x80 ohne Add-Flag, Länge 8 auf dem siebten Bit → 0x82 0x05
        let mut expected = vec![0x82, 0x05];
        expected.extend_from_slice(last.as_bytes());
        assert_eq!(enc.bytes(), &expected[..]);

        // Der letzte Eintrag innerhalb der Grenze bleibt referenzierbar.
        enc.flush_to(&mut std::io::sink()).unwrap();
        enc.characters(&format!("c{}", MAXIMUM_INDEX - 1)).unwrap();
        // Index 2^20 auf dem vierten Bit: 0xA0 | 0x18, dann 2^20 - 1 - 263184
        assert_eq!(enc.bytes(), &[0xB8, 0x0B, 0xFB, 0xEF]);
        enc.end_element().unwrap();
        enc.end_document().unwrap();
    }

    /// Volle Elementnamen-Tabelle: neue Namen bleiben literal, bekannte
    /// werden weiter indiziert.
    #[test]
    fn full_element_name_table_writes_literals() {
        let mut enc = started(SerializerOptions::default());
        enc.vocabulary.element_name = crate::vocabulary::QualifiedNameMap::with_max_index(1);
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        for _ in 0..2 {
            enc.start_element(NameRef::local("a"), &[], &[]).unwrap();
            enc.end_element().unwrap();
        }
        enc.start_element(NameRef::local("r"), &[], &[]).unwrap();
        enc.end_element().unwrap();
        enc.end_element().unwrap();

        let tokens = crate::trace::read_trace(&finished(enc)).unwrap();
        let names: Vec<String> = tokens
            .iter()
            .filter_map(|t| match t {
                crate::trace::Token::StartElement { name, .. } => Some(name.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["r", "a", "a", "#1"]);
    }
