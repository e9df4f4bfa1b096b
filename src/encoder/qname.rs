//! Qualified names, namespace attributes and identifying strings
//! (X.891 C.3.5, C.4, C.12, C.13, C.17, C.18).
//!
//! Element- und Attributnamen werden über den lexikalischen Namen
//! (`prefix:local`) im jeweiligen [`QualifiedNameMap`](crate::vocabulary::QualifiedNameMap)
//! nachgeschlagen. Treffer mit gleichem Namespace-Namen werden als Index
//! geschrieben, alles andere als literaler Name und danach registriert.

use crate::constants::{
    ATTRIBUTE_LITERAL_QNAME_FLAG, ELEMENT_LITERAL_QNAME_FLAG, LITERAL_QNAME_NAMESPACE_NAME_FLAG,
    LITERAL_QNAME_PREFIX_FLAG, NAMESPACE_ATTRIBUTE, NAMESPACE_ATTRIBUTE_NAME_FLAG,
    NAMESPACE_ATTRIBUTE_PREFIX_FLAG,
};
use crate::error::{Error, Result};
use crate::integer;
use crate::octet_stream::OctetWriter;
use crate::qname::QualifiedName;
use crate::string;
use crate::vocabulary::StringIndexMap;

use super::{Encoder, NameRef};

impl Encoder {
    /// Namespace attribute (C.12): prefix and namespace name as identifying
    /// strings, each optional.
    pub(super) fn encode_namespace_attribute(
        &mut self,
        prefix: &str,
        namespace_name: &str,
    ) -> Result<()> {
        let mut b = NAMESPACE_ATTRIBUTE;
        if !prefix.is_empty() {
            b |= NAMESPACE_ATTRIBUTE_PREFIX_FLAG;
        }
        if !namespace_name.is_empty() {
            b |= NAMESPACE_ATTRIBUTE_NAME_FLAG;
        }
        self.out.write_octet(b);
        if !prefix.is_empty() {
            write_identifying_string(&mut self.out, &mut self.vocabulary.prefix, prefix)?;
        }
        if !namespace_name.is_empty() {
            write_identifying_string(
                &mut self.out,
                &mut self.vocabulary.namespace_name,
                namespace_name,
            )?;
        }
        Ok(())
    }

    /// Element name on the third bit (C.3.5). `b` trägt die beiden führenden
    /// Bits (Element-Discriminant + Attribut-Flag).
    pub(super) fn encode_element_qname(&mut self, b: u8, name: NameRef<'_>) -> Result<()> {
        let namespace_name = self.intern(name.namespace_name);
        lexical_key(&mut self.key_buf, name);
        if let Some(index) = self
            .vocabulary
            .element_name
            .obtain(&self.key_buf, &namespace_name)
        {
            return integer::encode_on_third_bit(&mut self.out, b, index);
        }

        self.encode_literal_qname(b | ELEMENT_LITERAL_QNAME_FLAG, name)?;
        let qname = QualifiedName::new(name.prefix, namespace_name, name.local_name);
        self.vocabulary.element_name.register(&self.key_buf, qname);
        Ok(())
    }

    /// Attribute name on the second bit, first bit zero (C.4.3).
    pub(super) fn encode_attribute_qname(&mut self, name: NameRef<'_>) -> Result<()> {
        let namespace_name = self.intern(name.namespace_name);
        lexical_key(&mut self.key_buf, name);
        if let Some(index) = self
            .vocabulary
            .attribute_name
            .obtain(&self.key_buf, &namespace_name)
        {
            return integer::encode_on_second_bit_first_bit_zero(&mut self.out, index);
        }

        self.encode_literal_qname(ATTRIBUTE_LITERAL_QNAME_FLAG, name)?;
        let qname = QualifiedName::new(name.prefix, namespace_name, name.local_name);
        self.vocabulary.attribute_name.register(&self.key_buf, qname);
        Ok(())
    }

    /// Literal qualified name (C.18).
    ///
    /// Prefix und Namespace-Name müssen bereits im Vocabulary stehen (sie
    /// wurden über ein Namespace-Attribut eingeführt). Ein Prefix ohne
    /// Namespace wird ignoriert. Fehler werden gemeldet, bevor ein Octet
    /// geschrieben wird.
    fn encode_literal_qname(&mut self, mut b: u8, name: NameRef<'_>) -> Result<()> {
        if name.local_name.is_empty() {
            return Err(Error::structural("qualified name with empty local name"));
        }
        let mut prefix_index = None;
        let mut namespace_index = None;
        if !name.namespace_name.is_empty() {
            let index = self
                .vocabulary
                .namespace_name
                .get(name.namespace_name)
                .ok_or_else(|| Error::NamespaceNotIndexed(name.namespace_name.to_owned()))?;
            namespace_index = Some(index);
            b |= LITERAL_QNAME_NAMESPACE_NAME_FLAG;

            if !name.prefix.is_empty() {
                let index = self
                    .vocabulary
                    .prefix
                    .get(name.prefix)
                    .ok_or_else(|| Error::PrefixNotIndexed(name.prefix.to_owned()))?;
                prefix_index = Some(index);
                b |= LITERAL_QNAME_PREFIX_FLAG;
            }
        }

        self.out.write_octet(b);
        if let Some(index) = prefix_index {
            integer::encode_on_second_bit_first_bit_one(&mut self.out, index)?;
        }
        if let Some(index) = namespace_index {
            integer::encode_on_second_bit_first_bit_one(&mut self.out, index)?;
        }
        write_identifying_string(&mut self.out, &mut self.vocabulary.local_name, name.local_name)
    }
}

/// Identifying string on the first bit (C.13): index reference if `s` is in
/// `table`, otherwise the literal (which is then added).
pub(super) fn write_identifying_string(
    out: &mut OctetWriter,
    table: &mut StringIndexMap,
    s: &str,
) -> Result<()> {
    match table.obtain_index(s) {
        Some(index) => integer::encode_on_second_bit_first_bit_one(out, index),
        None => string::write_identifying_literal(out, s),
    }
}

/// Vocabulary-Key `prefix:local` bzw. `local`.
fn lexical_key(buf: &mut String, name: NameRef<'_>) {
    buf.clear();
    if !name.prefix.is_empty() {
        buf.push_str(name.prefix);
        buf.push(':');
    }
    buf.push_str(name.local_name);
}
